pub mod tree;

pub use tree::{
    is_binary_content, load_tree, LoadOptions, LoadedTree, TemplateNode, TemplateTree,
};
