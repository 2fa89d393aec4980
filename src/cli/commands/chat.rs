//! Interactive chat command.

use crate::agent::{AgentResponse, Message};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result;
use crate::orchestrator::Orchestrator;
use console::style;
use std::io::{self, BufRead, Write};

/// Messages kept in the terminal conversation before the oldest are dropped.
const MAX_HISTORY_MESSAGES: usize = 30;

/// Run the interactive chat command.
pub async fn run_chat(settings: Settings) -> anyhow::Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Converse, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'luch doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let agent_name = orchestrator.settings().agent.name.clone();
    let mut chat = ChatSession::new(orchestrator);

    println!("\n{}", style(format!("{} Chat", agent_name)).bold().cyan());
    println!(
        "{}\n",
        style("Type your message, or 'exit' to quit. Use 'clear' to reset conversation.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            chat.clear_history();
            Output::info("Conversation history cleared.");
            continue;
        }

        match chat.send_message(input).await {
            Ok(response) => {
                for call in &response.tool_calls {
                    println!("{}", style(format!("  [{}]", call)).dim());
                }
                Output::reply(&agent_name, &response.content);
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}

/// Terminal conversation holding the history between turns.
struct ChatSession {
    orchestrator: Orchestrator,
    history: Vec<Message>,
    max_history: usize,
}

impl ChatSession {
    fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            history: Vec::new(),
            max_history: MAX_HISTORY_MESSAGES,
        }
    }

    fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Send a message and record the exchange. A failed turn leaves history untouched.
    async fn send_message(&mut self, user_input: &str) -> Result<AgentResponse> {
        let response = self.orchestrator.respond(user_input, &self.history).await?;

        self.history.push(Message::user(user_input));
        self.history.push(Message::assistant(response.content.clone()));
        self.trim_history();

        Ok(response)
    }

    /// Drop the oldest exchanges once the history grows past the limit.
    fn trim_history(&mut self) {
        if self.history.len() > self.max_history {
            let excess = self.history.len() - self.max_history;
            // Remove whole user/assistant pairs
            let excess = excess + excess % 2;
            self.history.drain(..excess);
        }
    }
}
