use anyhow::Result;
use bookreel_agent::{GREETING, PolicyState, RecommenderAgent};
use bookreel_core::{Agent, Utterance};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// Text conversation with the recommender on stdin/stdout.
pub async fn run_console(agent: RecommenderAgent) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    println!("bookreel console");
    println!("Agent: {}", agent.name());
    println!("Type your message and press Enter. Ctrl+C to exit.\n");

    match agent.generate_reply(GREETING).await {
        Ok(reply) => println!("Agent -> {}\n", reply.text),
        Err(e) => eprintln!("Error: {e}"),
    }

    loop {
        match rl.readline("User -> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                rl.add_history_entry(&line)?;

                match agent.on_user_turn(&Utterance::new(line)).await {
                    Ok(reply) => println!("\nAgent -> {}\n", reply.text),
                    Err(e) => eprintln!("\nError: {e}\n"),
                }

                if agent.state().await == PolicyState::Done {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("EOF");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    Ok(())
}
