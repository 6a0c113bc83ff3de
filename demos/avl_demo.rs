//! Builds a small tree, prints it in order, removes two keys and prints again.
//!
//! Set `AVL_DEMO_TRACE=1` to see every rebalance and rotation.

use avl_rs::AvlTree;
use log::{info, LevelFilter, SetLoggerError};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

fn render(tree: &AvlTree<i32>) -> String {
    tree.inorder()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn main() -> Result<(), SetLoggerError> {
    let level = if std::env::var_os("AVL_DEMO_TRACE").is_some() {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    };
    TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)?;

    let mut tree = AvlTree::new();
    for value in [10, 20, 30, 40, 50, 25] {
        tree.insert(value);
    }
    info!("{} keys, height {}", tree.len(), tree.height());
    println!("AVL tree after insertions: {}", render(&tree));

    tree.remove(&20);
    tree.remove(&50);
    info!("{} keys, height {}", tree.len(), tree.height());
    println!("AVL tree after removing 20 and 50: {}", render(&tree));

    Ok(())
}
