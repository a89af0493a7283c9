use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use protocol::TranslationProgress;
use tokio::sync::{Notify, RwLock};
use tokio::time;

const SPINNER: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

/// Terminal view of the latest progress snapshot.
pub struct Bar {
    progress: Arc<RwLock<Option<TranslationProgress>>>,
    should_quit: Arc<RwLock<bool>>,
    notify: Arc<Notify>,
    disabled: bool,
}

impl Bar {
    pub async fn new() -> Bar {
        let disabled = !io::stdout().is_terminal();
        let bar = Bar {
            progress: Arc::new(RwLock::new(None)),
            should_quit: Arc::new(RwLock::new(false)),
            notify: Arc::new(Notify::new()),
            disabled,
        };
        bar.start().await;

        bar
    }

    pub async fn update(&self, progress: TranslationProgress) {
        let mut current = self.progress.write().await;
        *current = Some(progress);
    }

    pub async fn progress(&self) -> Option<TranslationProgress> {
        *self.progress.read().await
    }

    async fn start(&self) {
        if self.disabled {
            return;
        }

        let should_quit = self.should_quit.clone();
        let notify = self.notify.clone();
        let progress = self.progress.clone();
        tokio::spawn(async move {
            let mut idx = 0;
            let interval = Duration::from_millis(200);
            let line_len = app::LINE_LENGTH.saturating_sub(20);

            loop {
                let progress = { *progress.read().await };
                print!("\r{}", render(progress, SPINNER[idx], line_len).yellow());
                io::stdout().flush().ok();
                idx += 1;
                idx %= SPINNER.len();
                time::sleep(interval).await;
                if *should_quit.read().await {
                    break;
                }
            }
            notify.notify_one();
        });
    }

    pub async fn finish(&self) {
        if self.disabled {
            return;
        }

        {
            let mut should_quit = self.should_quit.write().await;
            *should_quit = true;
        }
        self.notify.notified().await;
        print!("\r{}\r", " ".repeat(*app::LINE_LENGTH));
    }

    pub fn message(&self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        if self.disabled {
            println!("{msg}");
        } else {
            println!("\r{}\r{msg}", " ".repeat(*app::LINE_LENGTH));
        }
    }
}

/// One frame. Before the first snapshot the total is shown as `?`.
fn render(progress: Option<TranslationProgress>, spinner: &str, line_len: usize) -> String {
    let Some(progress) = progress else {
        return format!("{spinner}|0%|{:░<line_len$}|[0/?]", "");
    };
    let per = progress.percent();
    let fill = "█".repeat(per * line_len / 100);
    let spinner = if progress.is_finished() { "✔" } else { spinner };
    let failed = if progress.failed > 0 {
        format!(" {} failed", progress.failed)
    } else {
        String::new()
    };

    format!(
        "{spinner}|{per}%|{fill:░<line_len$}|[{}/{}]{failed}",
        progress.completed, progress.total
    )
}
