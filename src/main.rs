use std::path::PathBuf;

use clap::Parser;
use env_logger::{Builder, Env};
use log::{debug, info, LevelFilter};
use tokio::io::{AsyncBufReadExt, BufReader};

use medbot::dataset::{DatasetProvider, FileDataset, RowSet};
use medbot::render::{render_answer, AnswerView};
use medbot::transcript::Transcript;
use medbot::pipeline::log_panics;
use medbot::{MedBotError, QuestionPipeline};

#[tokio::main]
async fn main() -> Result<(), MedBotError> {
    let cli = MedBotArgs::parse();

    let log_level = match cli.verbose {
        1 => LevelFilter::Debug,
        2 => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    let env = Env::new().filter("MEDBOT_LOG");
    Builder::new()
        .filter(Some("medbot"), log_level)
        .parse_env(env)
        .init();

    debug!("Arguments {:#?}", cli);
    log_panics();

    medbot_app(cli).await?;
    Ok(())
}

#[derive(Parser, Debug)]
#[clap(author, version, about = "Ask questions about the heart dataset", long_about = None)]
pub struct MedBotArgs {
    #[clap(short, long, parse(from_os_str), env = "MEDBOT_DATA",
    default_value = "data/heart.csv", help = "Dataset path (.csv or .parquet)")]
    data: PathBuf,
    #[clap(short, long, parse(from_occurrences),
    help = "Verbose level")]
    verbose: usize,
    #[clap(short, long, help = "Print each answer as JSON")]
    json: bool,
    #[clap(short, long, parse(from_os_str),
    help = "Write the conversation transcript to this CSV file on exit")]
    transcript: Option<PathBuf>,
    #[clap(short, long, parse(from_os_str),
    help = "Write the normalized dataset to this Parquet file before answering")]
    export: Option<PathBuf>,
    #[clap(help = "Question to answer; questions are read from stdin when omitted")]
    question: Vec<String>,
}

async fn medbot_app(opts: MedBotArgs) -> Result<(), MedBotError> {
    let dataset = FileDataset::new(&opts.data);
    // loaded once; the pipeline is served from memory afterwards
    let rows: RowSet =
        tokio::task::spawn_blocking(move || dataset.load_full_row_set()).await??;
    if let Some(path) = &opts.export {
        rows.write_parquet(path)?;
        info!("exported {} rows to {:?}", rows.height(), path);
    }
    let pipeline = QuestionPipeline::new(rows);
    let mut transcript = Transcript::new();

    if !opts.question.is_empty() {
        let question = opts.question.join(" ");
        ask(&pipeline, &mut transcript, &question, opts.json)?;
    } else {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if question == "exit" || question == "quit" {
                break;
            }
            ask(&pipeline, &mut transcript, question, opts.json)?;
        }
    }

    if let Some(path) = &opts.transcript {
        transcript.save_csv(path)?;
        info!("wrote {} transcript entries to {:?}", transcript.len(), path);
    }

    Ok(())
}

fn ask(
    pipeline: &QuestionPipeline<RowSet>,
    transcript: &mut Transcript,
    question: &str,
    json: bool,
) -> Result<(), MedBotError> {
    let answer = pipeline.answer(question);
    if json {
        println!("{}", serde_json::to_string(&AnswerView::new(question, &answer))?);
    } else {
        println!("{}\n", render_answer(&answer));
    }
    transcript.record(question, answer);
    Ok(())
}
