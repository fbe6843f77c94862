//! 扁平评论列表还原为回复树
//!
//! 输入按创建时间升序排列，输出的每一层保持同样的顺序。
//! 层级在创建时已校验，这里直接信任存储的 depth。

use std::collections::HashMap;

use domain::{Comment, CommentId, CommentNode};
use tracing::warn;

pub fn assemble_comment_tree(flat: Vec<Comment>) -> Vec<CommentNode> {
    let index: HashMap<CommentId, usize> = flat
        .iter()
        .enumerate()
        .map(|(position, comment)| (comment.id, position))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); flat.len()];
    let mut roots = Vec::new();
    let mut orphans = 0usize;

    for (position, comment) in flat.iter().enumerate() {
        match comment.parent_id {
            None => roots.push(position),
            Some(parent_id) => match index.get(&parent_id) {
                Some(&parent) if parent != position => children[parent].push(position),
                _ => orphans += 1,
            },
        }
    }

    if orphans > 0 {
        warn!(orphans, "dropping comments whose parent is missing");
    }

    // 先序遍历得到访问顺序，逆序处理时子节点总在父节点之前完成
    let mut order = Vec::with_capacity(flat.len());
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(position) = stack.pop() {
        order.push(position);
        stack.extend(children[position].iter().rev().copied());
    }

    let mut arena: Vec<Option<CommentNode>> =
        flat.into_iter().map(|c| Some(CommentNode::from(c))).collect();

    for &position in order.iter().rev() {
        let replies: Vec<CommentNode> = children[position]
            .iter()
            .filter_map(|&child| arena[child].take())
            .collect();
        if let Some(node) = arena[position].as_mut() {
            node.replies = replies;
        }
    }

    roots
        .into_iter()
        .filter_map(|position| arena[position].take())
        .collect()
}
