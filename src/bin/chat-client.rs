//! Terminal front-end for the chat relay.
//!
//! Type a message and press Enter to send it. End a line with `\` to keep
//! typing on the next line. `/attach <path>` stages a file, `/quit` exits.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use chat_relay::message::Attachment;
use chat_relay::ui::{ChatController, ChatView, HttpTransport, KeyOutcome, KeyPress, Sender};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const DEFAULT_SERVER: &str = "http://localhost:3000";

#[derive(Default)]
struct TerminalView {
    input: String,
}

impl ChatView for TerminalView {
    fn input_text(&self) -> String {
        self.input.clone()
    }

    fn clear_input(&mut self) {
        self.input.clear();
    }

    fn auto_grow_input(&mut self) {}

    fn append_message(&mut self, sender: Sender, text: &str) {
        let who = match sender {
            Sender::User => "you",
            Sender::Bot => "bot",
        };
        println!("{who}> {text}");
    }

    fn scroll_to_bottom(&mut self) {
        let _ = std::io::stdout().flush();
    }

    // A terminal prints text; nothing is interpreted as markup.
    fn renders_markup(&self) -> bool {
        false
    }
}

fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

async fn load_attachment(path: &str) -> anyhow::Result<Attachment> {
    let path = Path::new(path);
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(Attachment::new(name, guess_mime(path), data))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let server = std::env::var("CHAT_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER.to_string());
    let transport = HttpTransport::new(&server).context("failed to build HTTP client")?;
    let mut controller = ChatController::new(TerminalView::default(), transport);

    println!("Connected to {server}. Type /quit to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == "/quit" {
            break;
        }

        if let Some(path) = line.strip_prefix("/attach ") {
            match load_attachment(path.trim()).await {
                Ok(file) => controller.attach(file),
                Err(err) => eprintln!("{err:#}"),
            }
            continue;
        }

        if let Some(partial) = line.strip_suffix('\\') {
            controller.view_mut().input.push_str(partial);
            if controller.on_key(KeyPress::shift_enter()).await == KeyOutcome::InsertNewline {
                controller.view_mut().input.push('\n');
            }
            continue;
        }

        controller.view_mut().input.push_str(&line);
        controller.on_input();
        controller.on_key(KeyPress::enter()).await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_common_image_types() {
        assert_eq!(guess_mime(Path::new("cat.PNG")), "image/png");
        assert_eq!(guess_mime(Path::new("a/b.jpeg")), "image/jpeg");
        assert_eq!(guess_mime(Path::new("notes")), "application/octet-stream");
    }
}
