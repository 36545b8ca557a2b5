//! Interactive chat REPL

use crate::error::Result;
use crate::session::Session;
use futures::future::{BoxFuture, FutureExt};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::error;

const PROMPT: &str = ">>> ";

const HELP: &str = "\
Commands:
/clear - Clear the chat history and start a new conversation
/add - Add documents to a new collection
/activate <collection_name> - Activate a collection
/deactivate - Deactivate the active collection
/list - List available collections
/help - Show this help message
/bye - Exit the chat
ctrl + c - Stop the model from responding
ctrl + d - Exit the chat
";

const INTERRUPT_HINT: &str = "\nUse Ctrl + d or /bye to exit.";

/// Source of user interrupts: each call returns a future resolving on the next one
pub type Interrupt = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

fn ctrl_c() -> BoxFuture<'static, ()> {
    async {
        let _ = tokio::signal::ctrl_c().await;
    }
    .boxed()
}

/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Clear,
    Add,
    Activate(Option<String>),
    Deactivate,
    List,
    Help,
    Bye,
    Empty,
    Message(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "" => ReplCommand::Empty,
            "/clear" => ReplCommand::Clear,
            "/add" => ReplCommand::Add,
            "/activate" if rest.is_empty() => ReplCommand::Activate(None),
            "/activate" => ReplCommand::Activate(Some(rest.to_string())),
            "/deactivate" => ReplCommand::Deactivate,
            "/list" => ReplCommand::List,
            "/help" | "/?" => ReplCommand::Help,
            "/bye" => ReplCommand::Bye,
            _ => ReplCommand::Message(line.to_string()),
        }
    }
}

enum Flow {
    Continue,
    Exit,
}

enum Input {
    Line(Option<String>),
    Interrupt,
}

/// Prompt loop over any line source; an interrupt abandons the command in
/// flight (keeping a partial reply), EOF exits
pub struct Repl<'s, R, W> {
    session: &'s mut Session,
    input: Lines<R>,
    out: W,
    k: usize,
    interrupt: Interrupt,
}

impl<'s, R, W> Repl<'s, R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(session: &'s mut Session, input: R, out: W, k: usize) -> Self {
        Self {
            session,
            input: input.lines(),
            out,
            k,
            interrupt: Arc::new(ctrl_c),
        }
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub async fn run(&mut self) -> Result<()> {
        writeln!(
            self.out,
            "Chatting with {} (/? for help)",
            self.session.chat_model()
        )?;

        loop {
            write!(self.out, "{}", PROMPT)?;
            self.out.flush()?;

            let interrupted = (self.interrupt)();
            let input = tokio::select! {
                line = self.input.next_line() => Input::Line(line?),
                _ = interrupted => Input::Interrupt,
            };

            let line = match input {
                Input::Line(Some(line)) => line,
                Input::Line(None) => break,
                Input::Interrupt => {
                    writeln!(self.out, "{}", INTERRUPT_HINT)?;
                    continue;
                }
            };

            // A streaming reply handles its own interrupt, so it is polled first
            let interrupted = (self.interrupt)();
            let outcome = tokio::select! {
                biased;
                result = self.handle(&line) => Some(result),
                _ = interrupted => None,
            };

            match outcome {
                Some(Ok(Flow::Continue)) => {}
                Some(Ok(Flow::Exit)) => break,
                Some(Err(e)) => error!("{}", e),
                None => writeln!(self.out, "{}", INTERRUPT_HINT)?,
            }
        }

        Ok(())
    }

    async fn handle(&mut self, line: &str) -> Result<Flow> {
        match ReplCommand::parse(line) {
            ReplCommand::Empty => {}
            ReplCommand::Bye => {
                writeln!(self.out, "Goodbye!")?;
                return Ok(Flow::Exit);
            }
            ReplCommand::Clear => {
                self.session.clear_conversation();
                writeln!(self.out, "Conversation cleared.")?;
            }
            ReplCommand::Help => write!(self.out, "{}", HELP)?,
            ReplCommand::Activate(None) => {
                writeln!(self.out, "Usage: /activate <collection_name>")?;
            }
            ReplCommand::Activate(Some(name)) => {
                if self.session.activate(&name)? {
                    writeln!(self.out, "Collection '{}' activated.", name)?;
                } else {
                    writeln!(self.out, "Collection '{}' not found.", name)?;
                }
            }
            ReplCommand::Deactivate => {
                self.session.deactivate();
                writeln!(self.out, "Collection deactivated.")?;
            }
            ReplCommand::List => {
                let names = self.session.list_collections()?;
                if names.is_empty() {
                    writeln!(self.out, "No collections found.")?;
                } else {
                    for name in names {
                        writeln!(self.out, "  {}", name)?;
                    }
                }
            }
            ReplCommand::Add => self.add_collection().await?,
            ReplCommand::Message(query) => self.respond(&query).await?,
        }
        Ok(Flow::Continue)
    }

    async fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.out, "{}", prompt)?;
        self.out.flush()?;
        Ok(self.input.next_line().await?.map(|l| l.trim().to_string()))
    }

    async fn add_collection(&mut self) -> Result<()> {
        let mut paths = Vec::new();
        loop {
            match self
                .ask("Local path to document (file or dir) (/done to finish): ")
                .await?
            {
                None => return Ok(()),
                Some(line) if line == "/done" => break,
                Some(line) if line.is_empty() => {}
                Some(line) => paths.push(PathBuf::from(line)),
            }
        }

        if paths.is_empty() {
            writeln!(self.out, "No documents selected.")?;
            return Ok(());
        }

        let Some(name) = self.ask("Enter a name for the collection: ").await? else {
            return Ok(());
        };

        writeln!(self.out, "Adding documents to collection: {}", name)?;
        let collection = self.session.create_collection(&name, &paths).await?;
        writeln!(
            self.out,
            "Created collection '{}' with {} chunks.",
            collection.name,
            collection.len()
        )?;
        Ok(())
    }

    async fn respond(&mut self, query: &str) -> Result<()> {
        let cancel = (self.interrupt)();
        let reply = self
            .session
            .chat_turn(query, self.k, &mut self.out, cancel)
            .await?;
        writeln!(self.out)?;
        if reply.interrupted {
            writeln!(self.out, "[response interrupted]")?;
        }
        Ok(())
    }
}

/// Run the REPL on stdin/stdout after making sure the chat model is available
pub async fn cmd_chat(session: &mut Session, k: usize) -> Result<()> {
    session.ensure_chat_model().await?;

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = std::io::stdout();
    Repl::new(session, stdin, stdout.lock(), k).run().await
}
