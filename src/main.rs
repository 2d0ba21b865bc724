use clap::Parser;
use clap::Subcommand;
use faqbot::config::AppConfig;
use faqbot::models::FaqInput;
use faqbot::ChatService;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;

#[derive(Parser)]
#[command(name = "faqbot")]
#[command(about = "FAQ-driven chat responder")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat loop on stdin/stdout
    Chat,
    /// Ask a single question and print the response as JSON
    Ask {
        /// The question to resolve
        message: String,
    },
    /// Add or update a FAQ entry
    Upsert {
        question: String,
        answer: String,
        /// FAQ category
        #[arg(short = 'g', long, default_value = "general")]
        category: String,
    },
    /// Force recompute and persist all FAQ embeddings
    RebuildEmbeddings,
    /// Show corpus statistics
    Stats,
    /// Show recent unanswered questions
    Logs {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };
    faqbot::logging::init_logging(Some(&config))?;

    let service = ChatService::new(&config)?;

    match cli.command {
        Commands::Chat => run_chat_loop(&service).await?,
        Commands::Ask { message } => {
            let response = service.respond(&message).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Upsert {
            question,
            answer,
            category,
        } => {
            let mut input = FaqInput::new(question, answer);
            input.category = Some(category);
            let record = service.add_faq(input).await?;
            println!("Upserted FAQ {}", record.id);
        }
        Commands::RebuildEmbeddings => {
            let count = service.rebuild_embeddings().await;
            println!("Rebuilt embeddings for {count} FAQ entries");
        }
        Commands::Stats => {
            let stats = service.stats().await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Logs { limit } => {
            for line in service.recent_fallbacks(Some(limit)).await {
                println!("{line}");
            }
        }
    }

    Ok(())
}

async fn run_chat_loop(service: &ChatService) -> anyhow::Result<()> {
    println!("faqbot ready. Type a message, or an empty line to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let message = line.trim();
        if message.is_empty() {
            break;
        }
        match service.respond(message).await {
            Ok(reply) => println!(
                "[{}] {} ({} ms)",
                serde_json::to_string(&reply.source)?.trim_matches('"'),
                reply.response,
                reply.response_time_ms
            ),
            Err(e) => eprintln!("error: {e}"),
        }
    }

    Ok(())
}
