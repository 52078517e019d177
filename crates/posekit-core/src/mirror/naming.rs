//! Left/right control name mapping.

use crate::mode::Side;

const LEFT_SUFFIX: &str = "_l";
const RIGHT_SUFFIX: &str = "_r";
const LEFT_INFIX: &str = "_l_";
const RIGHT_INFIX: &str = "_r_";

/// Where a control name carries its side token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Suffix(Side),
    Infix(Side, usize),
}

fn find_token(name: &str) -> Option<Token> {
    if name.ends_with(LEFT_SUFFIX) {
        return Some(Token::Suffix(Side::Left));
    }
    if name.ends_with(RIGHT_SUFFIX) {
        return Some(Token::Suffix(Side::Right));
    }
    let left = name.find(LEFT_INFIX).map(|i| (i, Side::Left));
    let right = name.find(RIGHT_INFIX).map(|i| (i, Side::Right));
    match (left, right) {
        (Some(l), Some(r)) => Some(if l.0 < r.0 { l } else { r }),
        (l, r) => l.or(r),
    }
    .map(|(index, side)| Token::Infix(side, index))
}

/// Returns the side a control belongs to, `None` for central controls.
pub fn side_of(name: &str) -> Option<Side> {
    find_token(name).map(|token| match token {
        Token::Suffix(side) | Token::Infix(side, _) => side,
    })
}

/// Returns true if the control has no side token.
pub fn is_central(name: &str) -> bool {
    side_of(name).is_none()
}

/// Maps a control name to its opposite-side counterpart.
///
/// A trailing `_l`/`_r` is flipped; otherwise the leftmost embedded
/// `_l_`/`_r_` is flipped; otherwise the name maps to itself. Applying the
/// mapping twice always yields the original name.
pub fn mirror_name(name: &str) -> String {
    match find_token(name) {
        None => name.to_string(),
        Some(Token::Suffix(side)) => {
            let stem = &name[..name.len() - 2];
            format!("{}_{}", stem, side.opposite().token())
        }
        Some(Token::Infix(side, index)) => {
            let mut mirrored = String::with_capacity(name.len());
            mirrored.push_str(&name[..index]);
            mirrored.push('_');
            mirrored.push_str(side.opposite().token());
            mirrored.push('_');
            mirrored.push_str(&name[index + 3..]);
            mirrored
        }
    }
}
