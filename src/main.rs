use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::mpsc;

use folio_client::api::{Credentials, RegisterRequest};
use folio_client::{
    ApiClient, BlogService, ClientConfig, ClientStorage, ConsoleNotifier, FolioError, GameInput,
    GameRunner, PostDraft, PublishTarget, Published, RpcWalletProvider, SaveStatus,
    WalletSessionManager,
};

#[derive(Parser, Debug)]
#[command(name = "folio", about = "Blog, wallet profile and click game client", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List blog posts
    Posts,
    /// Show one post with its comments
    Post { id: u64 },
    /// Create a post on the backend, or on chain with --chain
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// Featured image URL (backend posts only)
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        chain: bool,
    },
    /// Comment on a post
    Comment { post_id: u64, content: String },
    /// Delete a post
    Delete { id: u64 },
    /// Tip a post in ETH through the blog contract
    Tip { post_id: u64, amount: String },
    /// Log in and store the token
    Login {
        username: String,
        #[arg(long, env = "FOLIO_PASSWORD")]
        password: String,
    },
    /// Create an account
    Register {
        username: String,
        #[arg(long, env = "FOLIO_PASSWORD")]
        password: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Forget the stored token
    Logout,
    /// Connect the wallet and record the connection
    Connect,
    /// Show the connected wallet's profile
    Profile,
    /// Set the connected wallet's nickname
    Nickname { nickname: String },
    /// Play the click game (Enter = click, q = quit)
    Play,
    /// Show the click game leaderboard
    Leaderboard,
    /// Toggle dark mode
    Theme,
}

type Manager = WalletSessionManager<RpcWalletProvider>;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    // RUST_LOG=debug for request-level output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ClientConfig::from_env();
    let storage = ClientStorage::new(config.data_dir.clone());
    let api = ApiClient::new(&config, storage.clone());
    let provider = RpcWalletProvider::from_config(&config);
    let manager = WalletSessionManager::new(provider, api, Arc::new(ConsoleNotifier));

    run(args.command, &config, &storage, &manager).await
}

async fn run(command: Command, config: &ClientConfig, storage: &ClientStorage, manager: &Manager) -> Result<()> {
    let blog = BlogService::new(manager);

    match command {
        Command::Posts => {
            for post in blog.list_posts().await? {
                println!("#{} {} (by {}, {})", post.id, post.title, post.author.username, post.created_at.format("%Y-%m-%d"));
                println!("    {}", post.excerpt());
            }
        }
        Command::Post { id } => {
            let view = blog.open_post(id).await?;
            println!("{}\nBy {} • {}\n", view.post.title, view.post.author.username, view.post.created_at.format("%Y-%m-%d"));
            println!("{}\n", view.post.content);
            println!("Comments ({})", view.comments().len());
            for comment in view.comments() {
                println!("  [{}] {}: {}", comment.id, comment.author.username, comment.content);
            }
        }
        Command::Create { title, content, image, chain } => {
            let target = if chain {
                manager.connect().await?;
                PublishTarget::Chain
            } else {
                PublishTarget::Rest
            };
            let draft = PostDraft {
                title,
                content,
                featured_image: image,
            };
            match blog.create_post(&draft, target).await? {
                Published::Rest(post) => println!("Created post #{}", post.id),
                Published::Chain(receipt) => println!("Post created on blockchain in tx {}", receipt.hash),
            }
        }
        Command::Comment { post_id, content } => {
            let mut view = blog.open_post(post_id).await?;
            let comment = blog.add_comment(&mut view, &content).await?;
            println!("Added comment #{} ({} total)", comment.id, view.comments().len());
        }
        Command::Delete { id } => {
            blog.delete_post(id).await?;
            println!("Deleted post #{}", id);
        }
        Command::Tip { post_id, amount } => {
            manager.connect().await?;
            let receipt = blog.tip_post(post_id, &amount).await?;
            println!("Thank you for your tip of {} ETH! (tx {})", amount, receipt.hash);
        }
        Command::Login { username, password } => {
            manager
                .api()
                .login(&Credentials { username, password })
                .await?;
            println!("Logged in");
        }
        Command::Register { username, password, email } => {
            let user = manager
                .api()
                .register(&RegisterRequest { username, password, email })
                .await?;
            println!("Registered {} (id {})", user.username, user.id);
        }
        Command::Logout => {
            manager.api().logout()?;
            println!("Logged out");
        }
        Command::Connect => {
            let address = manager.connect().await?;
            println!("Connected {}", address);
            if let Some(profile) = manager.profile() {
                println!("Connections: {}", profile.connection_count);
            }
        }
        Command::Profile => {
            let address = manager.connect().await?;
            let profile = manager.fetch_profile(&address).await?;
            println!("Address:     {}", profile.address);
            println!("Nickname:    {}", profile.nickname.as_deref().unwrap_or("Not set"));
            println!("Connections: {}", profile.connection_count);
            println!("First seen:  {}", profile.first_connection.format("%Y-%m-%d %H:%M"));
            println!("Games:       {}", profile.total_games_played);
            for (game, score) in &profile.high_scores {
                println!("  best {}: {}", game, score);
            }
            for record in profile.game_history.iter().take(10) {
                println!("  {} {} - {}", record.played_at.format("%Y-%m-%d %H:%M"), record.game_name, record.score);
            }
        }
        Command::Nickname { nickname } => {
            let address = manager.connect().await?;
            let profile = manager.update_nickname(&address, &nickname).await?;
            println!("Nickname set to {}", profile.nickname.unwrap_or_default());
        }
        Command::Play => play(config, manager).await?,
        Command::Leaderboard => {
            let runner = GameRunner::load(manager, config).await?;
            print_leaderboard(&runner);
        }
        Command::Theme => {
            let dark = storage.toggle_dark_mode().context("Failed to save preferences")?;
            println!("{} mode", if dark { "Dark" } else { "Light" });
        }
    }

    Ok(())
}

async fn play(config: &ClientConfig, manager: &Manager) -> Result<()> {
    match manager.connect().await {
        Ok(address) => println!("Playing as {}", address),
        Err(FolioError::ProviderUnavailable) => println!("Playing without a wallet"),
        Err(e) => return Err(e.into()),
    }

    let mut runner = GameRunner::load(manager, config).await?;
    let (sender, mut inputs) = mpsc::unbounded_channel();

    // stdin blocks, so read it off the runtime
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let input = if line.trim() == "q" {
                GameInput::Quit
            } else {
                GameInput::Click
            };
            if sender.send(input).is_err() {
                break;
            }
        }
    });

    println!("Press Enter to click, q + Enter to quit. {} seconds!", runner.session().duration());
    let result = runner.play(&mut inputs).await;

    println!("Final score: {}", result.score);
    match result.status {
        SaveStatus::Recorded(record) => println!("Score saved (record #{})", record.id),
        SaveStatus::NotConnected => println!("Connect your wallet to save your score!"),
        SaveStatus::Failed => println!("Score could not be saved"),
        SaveStatus::Abandoned => println!("Game abandoned"),
    }
    print_leaderboard(&runner);
    Ok(())
}

fn print_leaderboard(runner: &GameRunner<'_, RpcWalletProvider>) {
    println!("\nLeaderboard - {}", runner.game().name);
    if runner.leaderboard().is_empty() {
        println!("No scores yet. Be the first!");
        return;
    }
    for (rank, entry) in runner.leaderboard().iter().enumerate() {
        println!("{:>2}. {:<20} {}", rank + 1, entry.display_name(), entry.record.score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_comes_from_flag_or_env() {
        let args = Args::try_parse_from(["folio", "login", "demo", "--password", "secret"]).unwrap();
        assert!(matches!(args.command, Command::Login { password, .. } if password == "secret"));

        std::env::set_var("FOLIO_PASSWORD", "from-env");
        let args = Args::try_parse_from(["folio", "register", "demo"]).unwrap();
        std::env::remove_var("FOLIO_PASSWORD");
        assert!(matches!(args.command, Command::Register { password, .. } if password == "from-env"));
    }

    #[test]
    fn test_create_flags() {
        let args = Args::try_parse_from(["folio", "create", "--title", "T", "--content", "C", "--chain"]).unwrap();
        assert!(matches!(args.command, Command::Create { chain: true, image: None, .. }));
    }
}
