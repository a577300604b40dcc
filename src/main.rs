use clap::{Parser, Subcommand, ValueEnum};
use knucklebones::{
    prelude::*,
    session::config::{SameConfig, SingleConfig},
    share::share_query,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Share token (or a `?s=...` query) to restore before doing anything else
    #[arg(short, long, value_name = "TOKEN")]
    share: Option<String>,

    /// Random seed for reproducibility
    #[arg(long, default_value = None)]
    seed: Option<u64>,

    /// Flat modifier added to the roll
    #[arg(short, long, allow_hyphen_values = true)]
    modifier: Option<String>,

    /// Number of times to roll
    #[arg(short = 'n', long, default_value_t = 1)]
    times: usize,

    /// Print the roll history once done
    #[arg(long, default_value_t = false)]
    history: bool,

    /// Log at debug level
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Roll one die; a d20 may be rolled with advantage or disadvantage
    Single {
        #[arg(default_value = "20")]
        sides: String,
        #[arg(short, long, value_enum, default_value_t = RollType::Normal)]
        roll_type: RollType,
    },
    /// Roll several dice with the same number of sides
    Same { count: String, sides: String },
    /// Roll a pool of different dice, e.g. "2d20 + 1d8"
    Mixed { notation: String },
    /// Roll anything written in dice notation, or the restored configuration
    Roll { notation: Option<String> },
    /// Print the share token for the configuration without rolling
    Share,
    /// Print the configuration a share token holds
    Decode { token: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RollType {
    Normal,
    Adv,
    Dis,
}

impl From<RollType> for Advantage {
    fn from(value: RollType) -> Self {
        match value {
            RollType::Normal => Advantage::Normal,
            RollType::Adv => Advantage::Advantage,
            RollType::Dis => Advantage::Disadvantage,
        }
    }
}

/// Turns any parsed notation into pool rows, so `mixed "3d6"` rolls a pool.
fn into_pool(kind: RollKind) -> Vec<PoolRow> {
    match kind {
        RollKind::Single { sides, .. } => vec![PoolRow::new(1, sides)],
        RollKind::Same { count, sides } => vec![PoolRow::new(count, sides)],
        RollKind::Mixed { pool } => pool,
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::builder()
        .format_timestamp_secs()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .init();
    log::debug!("Starting with args: {:?}", args);

    let roller = match args.seed {
        Some(seed) => Roller::from_seed(seed),
        None => Roller::new(),
    };
    let mut session = Session::new(roller);

    if let Some(token) = &args.share
        && session.restore(token).is_err()
    {
        println!("Bad share link removed.");
    }

    let command = args.command.unwrap_or(Command::Roll { notation: None });
    let share_only = matches!(command, Command::Share);
    match command {
        Command::Decode { token } => {
            let patch = decode_link(&token)?;
            let mut config = RollConfig::new();
            config.apply(patch);
            println!("{}", serde_json::to_string_pretty(&config.share_state())?);
            return Ok(());
        }
        Command::Single { sides, roll_type } => {
            session.set_mode(RollMode::Single);
            session.config.single = SingleConfig {
                sides: sides.into(),
                advantage: roll_type.into(),
            };
        }
        Command::Same { count, sides } => {
            session.set_mode(RollMode::Same);
            session.config.same = SameConfig {
                count: count.into(),
                sides: sides.into(),
            };
        }
        Command::Mixed { notation } => {
            let plan = parse_roll(&notation)?;
            session.config.load_plan(RollPlan {
                modifier: plan.modifier,
                kind: RollKind::Mixed {
                    pool: into_pool(plan.kind),
                },
            });
        }
        Command::Roll {
            notation: Some(notation),
        } => {
            session.config.load_plan(parse_roll(&notation)?);
        }
        Command::Roll { notation: None } | Command::Share => {}
    }

    if let Some(modifier) = args.modifier {
        session.config.modifier = modifier.into();
    }

    if share_only {
        println!("{}", share_query(&session.share_token()?));
        return Ok(());
    }

    log::info!("{}", session.config.roll_button_label());
    for _ in 0..args.times {
        let result = session.roll()?;
        let mut buf = String::new();
        result.pretty_print(&mut buf)?;
        println!("{buf}");
    }

    if args.history {
        let mut buf = String::new();
        session.history.pretty_print(&mut buf)?;
        print!("{buf}");
    }

    println!("Share: ?{}", share_query(&session.share_token()?));

    Ok(())
}
