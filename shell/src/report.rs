//! Plain-text dump of pages, nodes and lines

use doc_model::{DocumentTree, NodeId};
use edit_engine::Document;

pub fn print_document(document: &Document) {
    let tree = document.tree();
    let pagination = document.pagination();
    for index in 0..pagination.page_count() {
        let height = pagination.content_height(tree, document.measurer(), index);
        println!("page {} ({:.0}px)", index + 1, height);
        for node in pagination.nodes_on_page(index) {
            print_node(tree, *node);
        }
    }

    let selection = document.selection();
    let focus = selection.focus();
    if selection.is_collapsed() {
        println!("caret: {} @ {}", focus.node(), focus.node_offset);
    } else {
        let anchor = selection.anchor();
        println!(
            "selection: {} @ {} -> {} @ {}",
            anchor.node(),
            anchor.node_offset,
            focus.node(),
            focus.node_offset
        );
    }
}

fn print_node(tree: &DocumentTree, node: NodeId) {
    let marker = if tree.previous_linked(node).is_some() { "  +" } else { "  " };
    let Ok(lines) = tree.lines_of(node) else {
        println!("{}[{}]", marker, node);
        return;
    };
    for (i, line) in lines.iter().enumerate() {
        let text = tree.line(*line).map(|l| l.text()).unwrap_or_default();
        let prefix = if i == 0 { marker } else { "   " };
        println!("{}|{}|", prefix, text);
    }
}
