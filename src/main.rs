use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pricing_session::facts::{DateFact, FactStatus};
use pricing_session::remote::PropertySnapshot;
use pricing_session::{
    AppError, Config, ConnectivityState, HttpPricingApi, Resolution, Session, SqliteStore,
};

#[derive(Parser)]
#[command(name = "pricing-session", about = "Inspect and drive the pricing session")]
struct Cli {
    /// Pricing service base URL (overrides PRICING_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// User whose properties are listed (overrides PRICING_USER_ID)
    #[arg(long, global = true)]
    user: Option<String>,
    /// Local cache file (overrides PRICING_STORE_PATH)
    #[arg(long, global = true)]
    store: Option<String>,
    /// Month names of the display language, January first
    #[arg(long, global = true, value_delimiter = ',')]
    months: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the active property and show whether pricing is enabled
    Status,
    /// Flip dynamic pricing for the active property
    Toggle,
    /// Switch to another property
    Select {
        id: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the ISO key for a displayed date
    Date(DateArgs),
    /// Load the MSP and price history for a displayed date
    Fact(DateArgs),
}

#[derive(Args)]
struct DateArgs {
    day: u32,
    month: String,
    year: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let mut cfg = Config::from_env()?;
    if let Some(url) = cli.api_url {
        cfg.api_base_url = url;
    }
    if let Some(user) = cli.user {
        cfg.user_id = user;
    }
    if let Some(path) = cli.store {
        cfg.store_path = path;
    }

    let store = SqliteStore::open(&cfg.store_path)?;
    let api = HttpPricingApi::new(&cfg.api_base_url, cfg.api_token.clone(), cfg.request_timeout())?;
    let mut session = Session::start(store, api, cfg.user_id.clone());
    if !cli.months.is_empty() {
        session.set_display_months(cli.months);
    }

    match cli.command {
        Command::Status => {
            let resolution = session.resolve_property();
            print_resolution(&resolution);
            print_state(&session.connectivity());
        }
        Command::Toggle => {
            let resolution = session.resolve_property();
            if resolution.property_id().is_none() && resolution != Resolution::NoProperty {
                print_resolution(&resolution);
                return Err(AppError::NoProperty);
            }
            let enabled = session.toggle_pricing()?;
            println!("pricing {}", on_off(enabled));
        }
        Command::Select { id, name } => {
            let snapshot = name.map(|name| PropertySnapshot {
                id: id.clone(),
                name,
            });
            session.navigate(&id, snapshot);
            print_state(&session.connectivity());
        }
        Command::Date(args) => match session.resolve_date(args.day, &args.month, &args.year) {
            Some(key) => println!("{key}"),
            None => println!("unresolvable"),
        },
        Command::Fact(args) => {
            let date = session
                .resolve_date(args.day, &args.month, &args.year)
                .ok_or_else(|| {
                    AppError::Unresolvable(format!("{} {} {}", args.day, args.month, args.year))
                })?;
            session.resolve_property();
            let fact = session.load_fact(date.clone()).ok_or(AppError::NoProperty)?;
            print_fact(&date.to_string(), &fact);
        }
    }

    Ok(())
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "online"
    } else {
        "offline"
    }
}

fn print_resolution(resolution: &Resolution) {
    match resolution {
        Resolution::Selected(id) => println!("property: {id}"),
        Resolution::Redirect(id) => println!("property: {id} (newest, selected)"),
        Resolution::Awaiting => println!("property: waiting for property list"),
        Resolution::Unavailable => println!("property: unknown (service unavailable)"),
        Resolution::NoProperty => println!("property: none yet, create your first property"),
    }
}

fn print_state(state: &ConnectivityState) {
    let scope = state.property_id.as_deref().unwrap_or("local only");
    let pending = if state.pending { " (update pending)" } else { "" };
    println!("pricing: {} [{scope}]{pending}", on_off(state.enabled));
}

fn print_fact(date: &str, fact: &DateFact) {
    match fact.status {
        FactStatus::Failed => println!("{date}: pricing data unavailable"),
        FactStatus::Idle | FactStatus::Loading => println!("{date}: loading"),
        FactStatus::Loaded => {
            match &fact.value {
                Some(msp) => println!(
                    "{date}: msp {:.2} {}",
                    msp.msp,
                    msp.currency.as_deref().unwrap_or("")
                ),
                None => println!("{date}: msp not configured"),
            }
            if let Some(history) = &fact.history {
                for p in &history.prices {
                    println!("  {:<24} {:>10.2}", p.competitor, p.price);
                }
            }
        }
    }
}
