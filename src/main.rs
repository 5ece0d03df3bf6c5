use std::io::{stdin, stdout, Write};
use std::sync::Arc;

use ai_db_sql_chat::config::Cli;
use ai_db_sql_chat::database::PgDatabase;
use ai_db_sql_chat::history::Turn;
use ai_db_sql_chat::llm::OllamaGenerator;
use ai_db_sql_chat::session::Session;
use ai_db_sql_chat::telemetry;
use ai_db_sql_chat::text_to_sql_chain::TextToSqlChain;
use anyhow::Error;
use clap::Parser;
use dotenvy::dotenv;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv().ok();
    telemetry::init_tracing()?;

    let cli = Cli::parse();
    let connection = cli.connection()?;

    info!(?connection, "connecting to database");
    let db = PgDatabase::connect(&connection, cli.sample_rows, cli.error_disclosure())
        .await?
        .with_schema(cli.db_schema.clone());
    let client = OllamaGenerator::new(&cli.generator());
    info!(model = client.model(), "connected");

    let mut session = Session::new();
    session.connect(TextToSqlChain::new(Arc::new(client), Arc::new(db)));

    for turn in session.history().turns() {
        print_turn(turn);
    }

    loop {
        print!("> ");
        stdout().flush()?;

        let mut input = String::new();
        if stdin().read_line(&mut input)? == 0 {
            break;
        }

        let question = input.trim();
        if question.is_empty() {
            continue;
        }
        if question == "exit" || question == "quit" {
            break;
        }

        match session.ask(question).await {
            Ok(_) => {
                if let Some(turn) = session.history().last() {
                    print_turn(turn);
                }
            }
            Err(e) => println!("{}", e.user_message()),
        }
    }

    Ok(())
}

fn print_turn(turn: &Turn) {
    println!("{}\n", turn);
}
