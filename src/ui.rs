//! Line-oriented terminal front end.
//!
//! This is a deliberately thin renderer over [`FeedController`]: it reads
//! commands from stdin, forwards them to the controller's operation hooks,
//! and reprints the feed whenever a background event settles. All feed
//! semantics live in the controller.

use crate::client::Article;
use crate::controller::{FeedController, FeedEvent};
use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Categories offered by the selector. The controller itself treats the
/// category as an opaque string; this list is presentation only.
pub const CATEGORIES: &[&str] = &[
    "general",
    "business",
    "entertainment",
    "health",
    "science",
    "sports",
    "technology",
];

/// Result of handling one input line.
pub enum Action {
    Continue,
    Quit,
}

/// A parsed input command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    Refresh,
    NextPage,
    PrevPage,
    Category(String),
    Search(String),
}

impl Command {
    /// Parse one input line. Returns `None` for blank or unrecognized input.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        match line {
            "" => None,
            "q" | "quit" => Some(Self::Quit),
            "h" | "help" | "?" => Some(Self::Help),
            "r" => Some(Self::Refresh),
            "n" => Some(Self::NextPage),
            "p" => Some(Self::PrevPage),
            _ => {
                if let Some(rest) = line.strip_prefix("c ") {
                    Some(Self::Category(rest.trim().to_string()))
                } else if let Some(rest) = line.strip_prefix('/') {
                    Some(Self::Search(rest.trim().to_string()))
                } else {
                    None
                }
            }
        }
    }
}

/// Run the interactive loop: multiplex stdin commands with controller
/// events until the user quits or stdin closes.
pub async fn run(
    controller: &mut FeedController,
    mut events: mpsc::Receiver<FeedEvent>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_help();
    render(controller);

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                let settled = matches!(event, FeedEvent::PageLoaded { .. });
                controller.handle_event(event);
                if settled {
                    render(controller);
                }
            }
            line = lines.next_line() => {
                match line? {
                    None => break, // stdin closed
                    Some(line) => match dispatch(controller, &line) {
                        Action::Quit => break,
                        Action::Continue => {}
                    },
                }
            }
        }
    }

    Ok(())
}

fn dispatch(controller: &mut FeedController, line: &str) -> Action {
    match Command::parse(line) {
        None => {
            if !line.trim().is_empty() {
                println!("Unrecognized command. Type 'h' for help.");
            }
        }
        Some(Command::Quit) => return Action::Quit,
        Some(Command::Help) => print_help(),
        Some(Command::Refresh) => controller.refresh(),
        Some(Command::NextPage) => {
            // Caller-gated: a short page means there is nothing further.
            if controller.has_next_page() {
                controller.next_page();
            } else {
                println!("No further pages.");
            }
        }
        Some(Command::PrevPage) => {
            if controller.has_prev_page() {
                controller.prev_page();
            } else {
                println!("Already at the first page.");
            }
        }
        Some(Command::Category(category)) => {
            if CATEGORIES.contains(&category.as_str()) {
                controller.set_category(category);
            } else {
                println!("Unknown category. One of: {}", CATEGORIES.join(", "));
            }
        }
        Some(Command::Search(query)) => controller.set_query(query),
    }
    Action::Continue
}

fn print_help() {
    println!("Commands: c <category> | /<query> | n(ext) | p(rev) | r(efresh) | q(uit) | h(elp)");
}

/// Print the current controller state: error branch pre-empts the feed.
pub fn render(controller: &FeedController) {
    println!();
    if let Some(error) = controller.error() {
        println!("Error: {}", error);
    } else if controller.loading() {
        println!("Loading...");
    } else if controller.articles().is_empty() {
        println!("No articles found.");
    } else {
        print_articles(controller.articles());
    }

    let mut footer = format!("[{} · page {}", controller.category(), controller.page());
    if !controller.query().is_empty() {
        footer.push_str(&format!(" · \"{}\"", controller.query()));
    }
    footer.push(']');
    if controller.has_prev_page() {
        footer.push_str(" p:prev");
    }
    if controller.has_next_page() {
        footer.push_str(" n:next");
    }
    println!("{}", footer);
}

/// Print a page of articles (also used by `--once` mode).
pub fn print_articles(articles: &[Article]) {
    for (i, article) in articles.iter().enumerate() {
        println!("{}. {}", i + 1, article.title);
        let mut byline = String::new();
        if let Some(author) = &article.author {
            byline.push_str(author);
        }
        if let Some(published) = article.published_at {
            if !byline.is_empty() {
                byline.push_str(" · ");
            }
            byline.push_str(&published.format("%Y-%m-%d").to_string());
        }
        if !byline.is_empty() {
            println!("   {}", byline);
        }
        if let Some(description) = &article.description {
            println!("   {}", description);
        }
        println!("   {}", article.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("q"), Some(Command::Quit));
        assert_eq!(Command::parse("quit"), Some(Command::Quit));
        assert_eq!(Command::parse("n"), Some(Command::NextPage));
        assert_eq!(Command::parse("p"), Some(Command::PrevPage));
        assert_eq!(Command::parse("r"), Some(Command::Refresh));
        assert_eq!(Command::parse("?"), Some(Command::Help));
    }

    #[test]
    fn test_parse_category_and_search() {
        assert_eq!(
            Command::parse("c technology"),
            Some(Command::Category("technology".to_string()))
        );
        assert_eq!(
            Command::parse("/climate change"),
            Some(Command::Search("climate change".to_string()))
        );
        // Bare slash clears the query.
        assert_eq!(Command::parse("/"), Some(Command::Search(String::new())));
    }

    #[test]
    fn test_parse_rejects_noise() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("   "), None);
        assert_eq!(Command::parse("nonsense"), None);
        assert_eq!(Command::parse("category technology"), None);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(Command::parse("  q  "), Some(Command::Quit));
        assert_eq!(
            Command::parse("c  business "),
            Some(Command::Category("business".to_string()))
        );
    }
}
