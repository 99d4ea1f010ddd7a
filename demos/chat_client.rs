//! Read-only chat client
//!
//! Connects anonymously (or with `TMI_USERNAME` / `TMI_TOKEN`), joins the
//! channel given on the command line and prints every chat message as
//! segments. The channel's 7TV emotes are loaded once its room id is known.
//!
//! ```text
//! RUST_LOG=tmi_proto=debug cargo run --example chat_client -- forsen
//! ```

use std::collections::HashMap;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use tmi_proto::{
    find_mentions, Command, EmoteCatalog, Event, EventKind, PersonSettings, Segment, Segmenter,
    Session, SessionConfig, TagName,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let channel = std::env::args()
        .nth(1)
        .context("usage: chat_client <channel>")?;
    let username = std::env::var("TMI_USERNAME").unwrap_or_else(|_| "justinfan12345".into());
    let token = std::env::var("TMI_TOKEN").unwrap_or_else(|_| "anonymous".into());

    let session = Session::new(SessionConfig::new(username, token));
    let (tx, mut messages) = mpsc::unbounded_channel();
    session.on(EventKind::Message, move |event| {
        if let Event::Message(msg) = event {
            let _ = tx.send(msg.clone());
        }
    });
    session.on(EventKind::Auth, |_| println!("✓ authenticated"));
    session.on(EventKind::Close, |_| println!("✗ connection closed"));

    let driver = session.start()?;
    session.join(&channel)?;

    let http = reqwest::Client::new();
    let people: HashMap<String, PersonSettings> = HashMap::new();
    let mut catalog = EmoteCatalog::unsupported();
    // One attempt per run; a failed load leaves the catalog unsupported.
    let mut catalog_tried = false;

    loop {
        tokio::select! {
            msg = messages.recv() => {
                let Some(msg) = msg else { break };
                match &msg.command {
                    Command::ROOMSTATE(_) if !catalog_tried => {
                        if let Some(room_id) = msg.tags.as_ref().and_then(|t| t.text(&TagName::RoomId)) {
                            catalog_tried = true;
                            catalog = EmoteCatalog::load(&http, room_id).await;
                            println!("loaded {} catalog emotes", catalog.len());
                        }
                    }
                    Command::PRIVMSG(_) => {
                        let (Some(segmenter), Some(text)) = (Segmenter::for_message(&msg), msg.text()) else {
                            continue;
                        };
                        let segments = segmenter
                            .with_catalog(&catalog)
                            .with_mentions(&find_mentions(text), &people)
                            .segments();
                        println!("{}: {}", msg.sender().unwrap_or("?"), render(&segments));
                    }
                    _ => {}
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.close();
    driver.await?;
    Ok(())
}

fn render(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Text { content } => content.clone(),
            Segment::Emote { display_name, .. } => format!("[{}]", display_name),
            Segment::Mention { display_name, color } => format!("{}({})", display_name, color),
        })
        .collect()
}
