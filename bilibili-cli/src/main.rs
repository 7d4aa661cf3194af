use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use bilibili_api::BiliClient;
use bilibili_api::store::JsonFileStore;
use bilibili_api::transport::HttpTransport;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bili", version, about = "Bilibili web API CLI")]
struct Cli {
    /// Session file (default: ~/.config/bilibili-api/userinfo.json)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// HTTP timeout in seconds
    #[arg(long, global = true, default_value = "30")]
    timeout: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search videos by title
    Search {
        /// Search keyword
        keyword: String,
        /// Result page (1-based)
        #[arg(short, long, default_value = "1")]
        page: u32,
    },
    /// List the parts of a video
    Pages {
        /// Video id (BV...)
        bvid: String,
    },
    /// Print the best audio stream URL of a video part
    Audio {
        /// Video id (BV...)
        bvid: String,
        /// Part content id (see `pages`)
        cid: u64,
        /// List every audio variant instead
        #[arg(short, long)]
        all: bool,
    },
    /// Dump one page of a favorites folder as JSON
    Favs {
        /// Favorites folder id (media_id)
        folder_id: u64,
        #[arg(short, long, default_value = "1")]
        page: u32,
        #[arg(short = 's', long, default_value = "20")]
        page_size: u32,
    },
    /// Dump a user's favorites folders as JSON
    Folders {
        /// User id (mid)
        user_id: u64,
    },
    /// Store a cookie (e.g. `SESSDATA` from a logged-in browser)
    Cookie {
        name: String,
        /// Omit to remove the cookie
        value: Option<String>,
    },
    /// Force a WBI key refresh
    Refresh,
    /// Delete the saved session
    Logout,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let store = match cli.config {
        Some(path) => JsonFileStore::new(path),
        None => JsonFileStore::open_default()?,
    };
    let connect = || -> Result<BiliClient> {
        let transport = HttpTransport::with_timeout(Duration::from_secs(cli.timeout))?;
        BiliClient::with_parts(store.clone(), transport).context("failed to initialize session")
    };

    match cli.command {
        Command::Search { keyword, page } => cmd_search(&mut connect()?, &keyword, page),
        Command::Pages { bvid } => cmd_pages(&mut connect()?, &bvid),
        Command::Audio { bvid, cid, all } => cmd_audio(&mut connect()?, &bvid, cid, all),
        Command::Favs {
            folder_id,
            page,
            page_size,
        } => print_json(connect()?.favorites_page(folder_id, page, page_size)),
        Command::Folders { user_id } => print_json(connect()?.user_favorites_folders(user_id)),
        Command::Cookie { name, value } => cmd_cookie(&mut connect()?, &name, value.as_deref()),
        Command::Refresh => {
            let mut client = connect()?;
            client.refresh_wbi_keys()?;
            let s = client.session();
            println!("img_key: {}\nsub_key: {}", s.img_key, s.sub_key);
            Ok(())
        }
        Command::Logout => {
            store.clear()?;
            println!("Session cleared.");
            Ok(())
        }
    }
}

// ── search ──

fn cmd_search(client: &mut BiliClient, keyword: &str, page: u32) -> Result<()> {
    let hits = client.search_page(keyword, page);
    if hits.is_empty() {
        println!("No results.");
    }
    for h in &hits {
        println!("  [{}] {} - {}", h.bvid, h.author, h.title);
    }
    Ok(())
}

// ── pages / audio ──

fn cmd_pages(client: &mut BiliClient, bvid: &str) -> Result<()> {
    for p in client.pages(bvid) {
        println!(
            "  P{:<3} cid={} {}:{:02} {}",
            p.page,
            p.cid,
            p.duration / 60,
            p.duration % 60,
            p.part
        );
    }
    Ok(())
}

fn cmd_audio(client: &mut BiliClient, bvid: &str, cid: u64, all: bool) -> Result<()> {
    if all {
        for s in client.try_audio_streams(bvid, cid)? {
            println!("  [{}] {} bps {}", s.id, s.bandwidth, s.base_url);
        }
        return Ok(());
    }
    let url = client.audio_link(bvid, cid);
    if url.is_empty() {
        anyhow::bail!("no audio stream for {bvid} cid={cid}");
    }
    println!("{url}");
    Ok(())
}

// ── favorites ──

fn print_json(data: Option<serde_json::Value>) -> Result<()> {
    let data = data.context("request failed (see log, RUST_LOG=info)")?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

// ── session ──

fn cmd_cookie(client: &mut BiliClient, name: &str, value: Option<&str>) -> Result<()> {
    if let Some(value) = value {
        client.add_cookie(name, value)?;
        println!("Cookie {name} saved.");
    } else if client.remove_cookie(name)? {
        println!("Cookie {name} removed.");
    } else {
        println!("No cookie named {name}.");
    }
    Ok(())
}
