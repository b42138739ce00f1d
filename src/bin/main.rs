use clap::{Parser, Subcommand};
use horoscope_proxy::{
    client::ProxyClient,
    dispatcher::{parse_birth_form, HoroscopeRequest},
    error::{ProxyError, NETWORK_UNAVAILABLE},
    render::render_reading,
    store::LastInputStore,
    ZODIAC_SIGNS,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "horoscope")]
#[command(about = "Daily horoscope readings through the horoscope proxy")]
struct Cli {
    /// Base URL of the running proxy
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    proxy_url: String,

    /// Where the last submitted birth details are kept
    #[arg(long, default_value = "birth_details.json")]
    state_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the twelve signs
    Signs,
    /// Generic reading for a sign
    Sign {
        sign: String,
        /// YYYY-MM-DD or "today"
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Personalized reading; omitted fields come from the last submission
    Personal {
        /// Birth date, YYYY-MM-DD
        #[arg(long)]
        birth_date: Option<String>,
        /// Birth time, HH:MM
        #[arg(long)]
        birth_time: Option<String>,
        /// Birth city, resolved through city search
        #[arg(long)]
        city: Option<String>,
        /// Reading date, YYYY-MM-DD or "today"
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Search for a city
    Cities { query: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let client = ProxyClient::new(&cli.proxy_url)?;

    let outcome = match cli.command {
        Command::Signs => {
            for sign in ZODIAC_SIGNS.iter() {
                println!(
                    "{} {:<12} {:<6} {}",
                    sign.symbol,
                    sign.name,
                    sign.element.to_string(),
                    sign.date_range
                );
            }
            Ok(())
        }
        Command::Sign { sign, date } => {
            match HoroscopeRequest::generic(Some(sign.as_str()), date.as_deref()) {
                Ok(request) => client
                    .fetch_horoscope(&request)
                    .await
                    .map(|r| println!("\n{}", render_reading(&r))),
                Err(e) => Err(e),
            }
        }
        Command::Personal {
            birth_date,
            birth_time,
            city,
            date,
        } => {
            let store = LastInputStore::new(&cli.state_file);
            personal(&client, &store, birth_date, birth_time, city, date).await
        }
        Command::Cities { query } => client.search_cities(&query).await.map(|results| {
            for city in results {
                println!(
                    "{}, {} ({:.4}, {:.4}) {}",
                    city.name, city.country, city.lat, city.lng, city.timezone
                );
            }
        }),
    };

    if let Err(e) = outcome {
        eprintln!("{}", e.user_message(NETWORK_UNAVAILABLE));
        return Err(Box::new(e) as Box<dyn std::error::Error>);
    }

    Ok(())
}

async fn personal(
    client: &ProxyClient,
    store: &LastInputStore,
    birth_date: Option<String>,
    birth_time: Option<String>,
    city: Option<String>,
    date: Option<String>,
) -> horoscope_proxy::Result<()> {
    let mut form = store.load().await.unwrap_or_default();

    if let Some(birth_date) = birth_date {
        form.date = birth_date;
    }
    if let Some(birth_time) = birth_time {
        form.time = birth_time;
    }
    if let Some(query) = city {
        let found = client.search_cities(&query).await?;
        form.city = Some(found.into_iter().next().ok_or_else(|| {
            ProxyError::InvalidInput(format!("No city found for \"{}\"", query))
        })?);
    }

    let place = match (&form.date, &form.city) {
        (d, Some(place)) if !d.is_empty() => place.clone(),
        _ => {
            return Err(ProxyError::InvalidInput(
                "Missing birth details: give --birth-date and --city".to_string(),
            ))
        }
    };

    let birth = parse_birth_form(
        &form.date,
        &form.time,
        place.lat,
        place.lng,
        Some(place.name.as_str()),
    )?;
    let request = HoroscopeRequest::personalized(birth, date.as_deref())?;

    store.save(&form).await?;
    info!(path = %store.path().display(), "Saved birth details");

    let response = client.fetch_horoscope(&request).await?;
    println!("\n{}", render_reading(&response));
    Ok(())
}
