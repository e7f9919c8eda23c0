// ===============================
// src/recorder.rs
// ===============================
//
// JSONL recorder yang ringan & tahan banting:
// - Tulis setiap Event ke file .jsonl (append), satu baris per event.
// - Bufer dengan BufWriter agar hemat syscall.
// - Flush periodik tiap 1s dan/atau tiap 1000 event.
// - Otomatis membuat parent directory jika belum ada.
// - Jika tulis gagal, coba reopen file dan lanjut.
//
// ENV: set `RECORD_FILE=/path/to/events.jsonl` agar aktif (lihat main.rs).
//
use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use tokio::{
    fs::{self, OpenOptions},
    io::{AsyncWriteExt, BufWriter},
    sync::mpsc,
    time::{interval, Duration, MissedTickBehavior},
};
use tracing::{error, info};

use crate::domain::{Order, Quote, Trade};
use crate::window::ClosedWindow;

#[derive(Debug, Clone, Serialize)]
pub enum Event {
    Quote(Quote),
    Trade(Trade),
    Window(ClosedWindow),
    Order(Order),
    Note(String),
}

#[derive(Serialize)]
struct Line<'a> {
    recorded_at: String,
    event: &'a Event,
}

async fn open_writer(path: &str) -> std::io::Result<BufWriter<fs::File>> {
    // Pastikan parent directory ada (kalau ada)
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path).await?;
    Ok(BufWriter::new(file))
}

fn to_line(ev: &Event) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(&Line { recorded_at: Utc::now().to_rfc3339(), event: ev })?;
    line.push('\n');
    Ok(line)
}

pub async fn run(mut rx: mpsc::Receiver<Event>, path: String) {
    info!(%path, "recorder: started");
    let mut writer = match open_writer(&path).await {
        Ok(w) => w,
        Err(e) => {
            error!(?e, %path, "recorder: open failed, recording disabled");
            return;
        }
    };

    let mut tick = interval(Duration::from_secs(1));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut since_last_flush: u32 = 0;
    const FLUSH_EVERY_N_EVENTS: u32 = 1000;

    loop {
        tokio::select! {
            maybe_ev = rx.recv() => {
                let Some(ev) = maybe_ev else {
                    // Channel closed: flush dan keluar
                    let _ = writer.flush().await;
                    info!("recorder: channel closed, stopped");
                    break;
                };
                let line = match to_line(&ev) {
                    Ok(s) => s,
                    Err(e) => {
                        error!(?e, "recorder: serialize error, skip event");
                        continue;
                    }
                };

                if let Err(e) = writer.write_all(line.as_bytes()).await {
                    error!(?e, "recorder: write_all failed, attempting reopen");
                    writer = match open_writer(&path).await {
                        Ok(w) => w,
                        Err(e2) => {
                            error!(?e2, "recorder: reopen failed, recording stopped");
                            return;
                        }
                    };
                    if let Err(e2) = writer.write_all(line.as_bytes()).await {
                        error!(?e2, "recorder: write_all failed again after reopen, drop event");
                        continue;
                    }
                }

                since_last_flush += 1;
                if since_last_flush >= FLUSH_EVERY_N_EVENTS {
                    let _ = writer.flush().await;
                    since_last_flush = 0;
                }
            }

            _ = tick.tick() => {
                let _ = writer.flush().await;
                since_last_flush = 0;
            }
        }
    }
}
