//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;
use itertools::Itertools;
use termtree::Tree;

use crate::application::VisibleRow;

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Print a labelled id list, `-` when empty
pub fn id_list(label: &str, ids: &[String]) {
    let joined = if ids.is_empty() {
        "-".to_string()
    } else {
        ids.iter().join(", ")
    };
    println!("{}: {}", label.green(), joined);
}

fn checkbox(row: &VisibleRow) -> &'static str {
    if row.is_checked {
        "[x]"
    } else if row.is_indeterminate {
        "[-]"
    } else {
        "[ ]"
    }
}

/// One rendered row: indentation, icon, checkbox, label.
pub fn format_row(row: &VisibleRow) -> String {
    let indent = "  ".repeat(row.depth);
    let icon = row.icon.as_deref().unwrap_or(" ");
    let label = if row.is_disabled {
        row.label.dimmed()
    } else if row.is_selected {
        row.label.reversed()
    } else if row.is_search_match {
        row.label.yellow().bold()
    } else {
        row.label.normal()
    };
    let mut line = format!("{}{} {} {}", indent, icon.cyan(), checkbox(row), label);
    if row.is_loading {
        line.push_str(&format!(" {}", "(loading)".dimmed()));
    }
    line
}

pub fn rows(rows: &[VisibleRow]) {
    for row in rows {
        println!("{}", format_row(row));
    }
}

pub trait TreeRowsConvert {
    /// One `termtree` per root row, nested by depth.
    fn to_term_trees(&self) -> Vec<Tree<String>>;
}

impl TreeRowsConvert for [VisibleRow] {
    fn to_term_trees(&self) -> Vec<Tree<String>> {
        let mut finished = Vec::new();
        let mut stack: Vec<(usize, Tree<String>)> = Vec::new();

        fn fold_into(stack: &mut Vec<(usize, Tree<String>)>, finished: &mut Vec<Tree<String>>) {
            if let Some((_, tree)) = stack.pop() {
                match stack.last_mut() {
                    Some((_, parent)) => {
                        parent.push(tree);
                    }
                    None => finished.push(tree),
                }
            }
        }

        for row in self {
            while stack.last().is_some_and(|(depth, _)| *depth >= row.depth) {
                fold_into(&mut stack, &mut finished);
            }
            stack.push((row.depth, Tree::new(row.label.clone())));
        }
        while !stack.is_empty() {
            fold_into(&mut stack, &mut finished);
        }
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, depth: usize) -> VisibleRow {
        VisibleRow {
            id: id.into(),
            label: id.to_uppercase(),
            depth,
            icon: None,
            is_expanded: false,
            is_leaf: true,
            is_selected: false,
            is_checked: false,
            is_indeterminate: false,
            is_search_match: false,
            is_loading: false,
            is_disabled: false,
        }
    }

    #[test]
    fn given_flat_rows_when_converting_then_nests_by_depth() {
        let rows = vec![row("r", 0), row("a", 1), row("a1", 2), row("b", 1), row("s", 0)];
        let trees = rows.to_term_trees();
        assert_eq!(trees.len(), 2);
        assert_eq!(trees[0].root, "R");
        assert_eq!(trees[0].leaves.len(), 2);
        assert_eq!(trees[0].leaves[0].leaves[0].root, "A1");
        assert!(trees[1].leaves.is_empty());
    }

    #[test]
    fn given_checked_and_indeterminate_when_formatting_then_checkbox_marks() {
        colored::control::set_override(false);
        let mut checked = row("a", 1);
        checked.is_checked = true;
        let mut partial = row("b", 0);
        partial.is_indeterminate = true;
        assert_eq!(format_row(&checked), "    [x] A");
        assert_eq!(format_row(&partial), "  [-] B");
    }
}
