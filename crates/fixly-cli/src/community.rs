//! Community board command handlers.

use chrono::Local;
use clap::Subcommand;

use fixly_api::CommunityPost;
use fixly_session::SessionManager;

use crate::auth::require_session;
use crate::bookings::truncate;

/// Sub-commands available under `community`.
#[derive(Debug, Subcommand)]
pub(crate) enum CommunityCommands {
    /// List recent posts
    Posts,
    /// Publish a post
    Post {
        /// Post title
        #[arg(long)]
        title: String,
        /// Post body
        #[arg(long)]
        content: String,
    },
    /// Comment on a post
    Comment {
        /// Post id
        id: String,
        /// Comment text
        text: String,
    },
}

/// Dispatch a community sub-command.
///
/// # Errors
///
/// Returns an error when no session can be restored or the backend
/// rejects the request.
pub(crate) async fn run_community(
    session: &mut SessionManager,
    command: CommunityCommands,
) -> anyhow::Result<()> {
    require_session(session).await?;
    match command {
        CommunityCommands::Posts => run_posts(session).await,
        CommunityCommands::Post { title, content } => run_post(session, &title, &content).await,
        CommunityCommands::Comment { id, text } => run_comment(session, &id, &text).await,
    }
}

async fn run_posts(session: &mut SessionManager) -> anyhow::Result<()> {
    let posts = session.api().posts().await?;
    if posts.is_empty() {
        println!("no posts yet; start one with `fixly community post`");
        return Ok(());
    }

    println!("{:<26}{:<12}{:<9}TITLE", "ID", "DATE", "REPLIES");
    for post in &posts {
        print_post_row(post);
    }
    Ok(())
}

fn print_post_row(post: &CommunityPost) {
    let date = post
        .created_at
        .with_timezone(&Local)
        .format("%Y-%m-%d")
        .to_string();
    println!(
        "{:<26}{:<12}{:<9}{}",
        post.id,
        date,
        post.comments.len(),
        truncate(&post.title, 50),
    );
}

async fn run_post(session: &mut SessionManager, title: &str, content: &str) -> anyhow::Result<()> {
    let post = session.api().create_post(title, content).await?;
    println!("Posted {} \u{2014} {}", post.id, post.title);
    Ok(())
}

async fn run_comment(session: &mut SessionManager, id: &str, text: &str) -> anyhow::Result<()> {
    let comment = session.api().add_comment(id, text).await?;
    println!("Comment {} added.", comment.id);
    Ok(())
}
