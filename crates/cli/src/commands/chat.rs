//! `fieldvoice chat` — Interactive conversation.

use std::io::Write;

use fieldvoice_agent::{ThinkingRegistry, TurnRequest};
use fieldvoice_core::message::ConversationId;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{SessionArgs, build_pipeline, load_config};

pub async fn run(
    session: SessionArgs,
    conversation: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;

    let thinking = ThinkingRegistry::new();
    let mut events = thinking.connect(&session.user);
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            eprint!("  {}", event.message);
        }
    });

    let pipeline = build_pipeline(&config, &session, Some(thinking.clone())).await?;
    let mut conversation_id = conversation.map(ConversationId);

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║          FieldVoice — Interactive Mode        ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Model:     {}", config.model);
    println!("  Index:     {}", config.search.index);
    println!("  Store:     {}", config.store.backend);
    match session.profile().coordinates() {
        Some((lat, lon)) => println!("  Location:  {lat}, {lon}"),
        None => println!("  Location:  unknown (weather disabled)"),
    }
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            print!("  You > ");
            std::io::stdout().flush()?;
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        let mut request = TurnRequest::new(&session.user, line);
        if let Some(id) = &conversation_id {
            request = request.in_conversation(id.clone());
        }

        match pipeline.process_turn(request).await {
            Ok(outcome) => {
                eprint!("\r              \r");
                println!();
                for line in outcome.answer.lines() {
                    println!("  FieldVoice > {line}");
                }
                println!();
                conversation_id = Some(outcome.conversation.id);
            }
            Err(e) => {
                eprint!("\r              \r");
                eprintln!("  [Error] {e}");
                println!();
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    thinking.disconnect(&session.user);

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}
