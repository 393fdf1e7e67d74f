// font_introspector was retired from https://github.com/dfrg/swash
// which is licensed under MIT license

//! Drivers that apply AAT subtables to a glyph buffer.

use super::buffer::Buffer;
use crate::internal::aat::{kern, kerx, morx};

/// Applies every chain of the `morx` table at the specified offset.
/// `selectors` is a sorted list of (feature, setting) pairs that toggle
/// optional chain features on top of the default flags.
pub fn apply_morx(
    data: &[u8],
    morx: u32,
    buffer: &mut Buffer,
    selectors: &[(u16, u16)],
) -> Option<()> {
    for chain in morx::chains(data, morx) {
        apply_chain(&chain, buffer, selectors);
    }
    buffer.ensure_order(false);
    Some(())
}

/// Applies a single metamorphosis chain.
pub fn apply_chain(
    chain: &morx::Chain,
    buffer: &mut Buffer,
    selectors: &[(u16, u16)],
) -> Option<()> {
    use morx::SubtableKind;
    // Bounded so a hostile state table cannot spin forever.
    let max_ops = buffer.glyphs.len().max(1) * 16;
    let mut flags = chain.default_flags();
    if !selectors.is_empty() {
        for feature in chain.features() {
            let key = (feature.selector, feature.setting_selector);
            if selectors.binary_search(&key).is_ok() {
                flags = flags & feature.disable_flags | feature.enable_flags;
            }
        }
    }
    for subtable in chain.subtables() {
        if subtable.flags() & flags == 0 || subtable.is_vertical() {
            continue;
        }
        buffer.ensure_order(subtable.should_reverse(buffer.is_rtl));
        let mut ops = 0;
        match subtable.kind() {
            Some(SubtableKind::Rearrangement(t)) => {
                let mut state = morx::RearrangementState::new();
                let mut i = 0;
                while i < buffer.glyphs.len() && ops < max_ops {
                    let id = buffer.glyphs[i].id;
                    match t.next(&mut state, i, id, false, |r| {
                        r.apply(&mut buffer.glyphs);
                        Some(())
                    }) {
                        Some(advance) => i += advance,
                        None => break,
                    }
                    ops += 1;
                }
                t.next(&mut state, i, 0, true, |r| {
                    r.apply(&mut buffer.glyphs);
                    Some(())
                });
            }
            Some(SubtableKind::Contextual(t)) => {
                let mut state = morx::ContextualState::new();
                for i in 0..buffer.glyphs.len() {
                    let id = buffer.glyphs[i].id;
                    t.next(&mut state, i, id, false, |index, id| {
                        buffer.substitute(index, id);
                        Some(())
                    });
                }
                if let Some(last) = buffer.glyphs.last().map(|g| g.id) {
                    t.next(&mut state, buffer.glyphs.len() - 1, last, true, |index, id| {
                        buffer.substitute(index, id);
                        Some(())
                    });
                }
            }
            Some(SubtableKind::NonContextual(t)) => {
                for g in buffer.glyphs.iter_mut() {
                    if let Some(id) = t.substitute(g.id) {
                        g.id = id;
                    }
                }
            }
            Some(SubtableKind::Ligature(t)) => {
                let mut state = morx::LigatureState::new();
                let mut i = 0;
                while i < buffer.glyphs.len() && ops < max_ops {
                    let id = buffer.glyphs[i].id;
                    if t.next(&mut state, i, id, false, |index, ligature, components| {
                        buffer.substitute_ligature(index, ligature, components);
                        Some(())
                    })
                    .is_none()
                    {
                        break;
                    }
                    i += 1;
                    ops += 1;
                }
                t.next(
                    &mut state,
                    buffer.glyphs.len().saturating_sub(1),
                    0,
                    true,
                    |index, ligature, components| {
                        buffer.substitute_ligature(index, ligature, components);
                        Some(())
                    },
                );
            }
            Some(SubtableKind::Insertion(t)) => {
                let mut state = morx::InsertionState::new();
                let mut i = 0;
                while i < buffer.glyphs.len() && ops < max_ops {
                    let id = buffer.glyphs[i].id;
                    match t.next(&mut state, i, id, false, |index, glyphs| {
                        insert(buffer, index, glyphs);
                        Some(())
                    }) {
                        Some(advance) => i += advance,
                        None => break,
                    }
                    ops += 1;
                }
                t.next(
                    &mut state,
                    buffer.glyphs.len().saturating_sub(1),
                    0,
                    true,
                    |index, glyphs| {
                        insert(buffer, index, glyphs);
                        Some(())
                    },
                );
            }
            None => {}
        }
    }
    Some(())
}

fn insert(buffer: &mut Buffer, index: usize, glyphs: crate::internal::Array<u16>) {
    let index = index.min(buffer.glyphs.len());
    buffer.multiply(index, glyphs.len());
    for (slot, id) in buffer.glyphs[index..index + glyphs.len()]
        .iter_mut()
        .zip(glyphs.iter())
    {
        slot.id = id;
    }
}

/// Applies the horizontal, non-cross-stream subtables of a `kerx` table
/// to the buffer's kerning adjustments.
pub fn apply_kerx(data: &[u8], kerx: u32, ankr: u32, buffer: &mut Buffer) -> Option<()> {
    use kerx::SubtableKind;
    for subtable in kerx::subtables(data, kerx, ankr) {
        if subtable.is_vertical() || subtable.is_cross_stream() {
            continue;
        }
        buffer.ensure_order(subtable.should_reverse(buffer.is_rtl));
        match subtable.kind() {
            Some(SubtableKind::Pairs(t)) => {
                apply_pairs(buffer, |left, right| t.get(left, right));
            }
            Some(SubtableKind::Classes(t)) => {
                apply_pairs(buffer, |left, right| t.get(left, right));
            }
            Some(SubtableKind::Contextual(t)) => {
                let mut state = kerx::ContextualState::new();
                let mut i = 0;
                let len = buffer.glyphs.len();
                while i < len {
                    let id = buffer.glyphs[i].id;
                    match t.next(&mut state, i, id, |index, value| {
                        if let Some(slot) = buffer.kerning.get_mut(index) {
                            *slot += value as f32;
                        }
                        Some(())
                    }) {
                        Some(advance) => i += advance,
                        None => break,
                    }
                }
            }
            // Anchor attachment needs mark positioning, which lives in
            // the shaper above this crate.
            Some(SubtableKind::ControlPoints(_)) | None => {}
        }
    }
    buffer.ensure_order(false);
    Some(())
}

/// Applies the horizontal subtables of a legacy `kern` table.
pub fn apply_kern(data: &[u8], kern: u32, buffer: &mut Buffer) -> Option<()> {
    use kern::SubtableKind;
    for subtable in kern::subtables(data, kern) {
        if !subtable.is_horizontal() || subtable.cross_stream() {
            continue;
        }
        buffer.ensure_order(false);
        match subtable.kind() {
            Some(SubtableKind::Pairs(t)) => {
                apply_pairs(buffer, |left, right| t.get(left, right));
            }
            Some(SubtableKind::Classes(t)) => {
                apply_pairs(buffer, |left, right| t.get(left, right));
            }
            Some(SubtableKind::Contextual(t)) => {
                let mut state = kern::ContextualState::new();
                let mut i = 0;
                let len = buffer.glyphs.len();
                while i < len {
                    let id = buffer.glyphs[i].id;
                    match t.next(&mut state, i, id, |index, value| {
                        if let Some(slot) = buffer.kerning.get_mut(index) {
                            *slot += value as f32;
                        }
                        Some(())
                    }) {
                        Some(advance) => i += advance,
                        None => break,
                    }
                }
            }
            None => {}
        }
    }
    buffer.ensure_order(false);
    Some(())
}

// Pair kerning adds the adjustment to the left glyph's advance; deleted
// glyphs never participate.
fn apply_pairs(buffer: &mut Buffer, get: impl Fn(u16, u16) -> Option<i16>) {
    let len = buffer.len();
    let mut left_index = match buffer
        .glyphs
        .iter()
        .position(|g| g.id != super::buffer::DELETED_GLYPH)
    {
        Some(index) => index,
        None => return,
    };
    let mut left = buffer.glyphs[left_index].id;
    for i in left_index + 1..len {
        if buffer.glyphs[i].id == super::buffer::DELETED_GLYPH {
            continue;
        }
        let right = buffer.glyphs[i].id;
        if let Some(kerning) = get(left, right) {
            if kerning != 0 {
                buffer.kerning[left_index] += kerning as f32;
            }
        }
        left_index = i;
        left = right;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::GlyphInfo;

    #[test]
    fn pair_kerning_skips_deleted() {
        let mut buffer = Buffer::new(
            vec![
                GlyphInfo::new(1, 0),
                GlyphInfo::new(super::super::buffer::DELETED_GLYPH, 1),
                GlyphInfo::new(2, 2),
            ],
            false,
        );
        apply_pairs(&mut buffer, |left, right| {
            (left == 1 && right == 2).then_some(-30)
        });
        assert_eq!(buffer.kerning, [-30., 0., 0.]);
    }
}
