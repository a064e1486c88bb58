//! The fixed universe of visible symbols.
//!
//! Built once per process and shared by every codebook. The pool carries no
//! secret; only the per-message shuffle does. Order matters: two builds
//! that disagree on pool order produce incompatible codebooks.

use std::{collections::HashSet, sync::OnceLock};

/// Number of symbols in a codebook (one per byte value)
pub const SYMBOL_COUNT: usize = 256;

/// Emoji and common ideographs
const BASE_SYMBOLS: &str =
    "😀😂😎😅🥳😇🤓🧐😋😛🤯💥🌟🔥🍀🎵🎶✨🌈💫🪐一二三四五六七八九十你好我他她它";

/// Extended ideographs
const EXTENDED_SYMBOLS: &str = concat!(
    "天地人日月水火木金土山川河流海洋森林草原沙漠城市乡村春夏秋冬东西南北前后左右上下",
    "大小多少长短高低快慢新旧好坏美丑真假善恶是非黑白红绿蓝黄紫橙灰棕粉金银铜铁钢铝",
    "石沙泥草花树鸟兽鱼虫车船飞机房屋门窗桌椅床柜书笔纸墨画音乐舞蹈诗歌小说散文戏剧",
    "电影电视电脑手机网络游戏运动健康快乐悲伤愤怒恐惧惊讶平静紧张放松忙碌空闲",
);

/// Mathematics, Greek, card/music glyphs, arrows, currency and punctuation,
/// followed by weather and descriptive ideographs
const VISIBLE_SYMBOLS: &str = concat!(
    "∑∏∫√∞±×÷≤≥≠≈≡∈∉⊂⊃∪∩∅∀∃∧∨¬⇒⇔",
    "αβγδεζηθικλμνξοπρστυφχψωΑΒΓΔΕΖΗΘΙΚΛΜΝΞΟΠΡΣΤΥΦΧΨΩ",
    "★☆♠♣♥♦♪♫♬♭♮♯←→↑↓↔↕↖↗↘↙©®™€£¥$¢§¶†‡•…‰‹›«»„‚",
    "风雷雨雪霜雾云霞虹霓电闪雷鸣雨过天晴春暖花开夏日炎炎秋高气爽冬雪纷飞东南西北中上下",
    "左右前后内外远近高低深浅粗细长短宽窄厚薄轻重快慢新旧好坏酸甜苦辣咸香臭美丑真假善恶",
    "是非黑白红绿蓝黄紫橙灰棕粉金银铜铁钢铝",
);

/// Unicode blocks scanned, in order, when the curated sets run short
const FALLBACK_RANGES: &[(u32, u32)] = &[
    (0x2000, 0x206F),   // General Punctuation
    (0x2070, 0x209F),   // Superscripts and Subscripts
    (0x20A0, 0x20CF),   // Currency Symbols
    (0x2100, 0x214F),   // Letterlike Symbols
    (0x2190, 0x21FF),   // Arrows
    (0x2200, 0x22FF),   // Mathematical Operators
    (0x2300, 0x23FF),   // Miscellaneous Technical
    (0x2400, 0x243F),   // Control Pictures
    (0x2440, 0x245F),   // Optical Character Recognition
    (0x2460, 0x24FF),   // Enclosed Alphanumerics
    (0x2500, 0x257F),   // Box Drawing
    (0x2580, 0x259F),   // Block Elements
    (0x25A0, 0x25FF),   // Geometric Shapes
    (0x2600, 0x26FF),   // Miscellaneous Symbols
    (0x2700, 0x27BF),   // Dingbats
    (0x27C0, 0x27EF),   // Miscellaneous Mathematical Symbols-A
    (0x27F0, 0x27FF),   // Supplemental Arrows-A
    (0x2900, 0x297F),   // Supplemental Arrows-B
    (0x2980, 0x29FF),   // Miscellaneous Mathematical Symbols-B
    (0x2A00, 0x2AFF),   // Supplemental Mathematical Operators
    (0x2B00, 0x2BFF),   // Miscellaneous Symbols and Arrows
    (0x1F300, 0x1F5FF), // Miscellaneous Symbols and Pictographs
    (0x1F600, 0x1F64F), // Emoticons
    (0x1F680, 0x1F6FF), // Transport and Map Symbols
    (0x1F700, 0x1F77F), // Alchemical Symbols
    (0x1F780, 0x1F7FF), // Geometric Shapes Extended
    (0x1F800, 0x1F8FF), // Supplemental Arrows-C
    (0x1F900, 0x1F9FF), // Supplemental Symbols and Pictographs
];

/// Printable ASCII, the last resort
const ASCII_RANGE: (u32, u32) = (0x21, 0x7E);

static POOL: OnceLock<Vec<String>> = OnceLock::new();

/// The process-wide symbol pool: exactly [`SYMBOL_COUNT`] distinct symbols.
pub fn symbol_pool() -> &'static [String] {
    POOL.get_or_init(|| build_pool(&[BASE_SYMBOLS, EXTENDED_SYMBOLS, VISIBLE_SYMBOLS]))
}

/// Assemble a pool from curated sets, topping up from the fallback ranges.
fn build_pool(curated: &[&str]) -> Vec<String> {
    let mut builder = PoolBuilder::default();

    for ch in curated.iter().flat_map(|set| set.chars()) {
        if builder.is_full() {
            break;
        }
        builder.push(ch);
    }

    for &(start, end) in FALLBACK_RANGES.iter().chain(std::iter::once(&ASCII_RANGE)) {
        for code in start..=end {
            if builder.is_full() {
                return builder.symbols;
            }
            if let Some(ch) = char::from_u32(code) {
                builder.push(ch);
            }
        }
    }

    builder.symbols
}

#[derive(Default)]
struct PoolBuilder {
    seen: HashSet<char>,
    symbols: Vec<String>,
}

impl PoolBuilder {
    fn is_full(&self) -> bool {
        self.symbols.len() >= SYMBOL_COUNT
    }

    fn push(&mut self, ch: char) {
        if self.seen.insert(ch) {
            self.symbols.push(ch.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_has_exactly_256_distinct_symbols() {
        let pool = symbol_pool();
        assert_eq!(pool.len(), SYMBOL_COUNT);

        let unique: HashSet<&String> = pool.iter().collect();
        assert_eq!(unique.len(), SYMBOL_COUNT);
    }

    #[test]
    fn curated_sets_fill_the_pool_in_insertion_order() {
        let pool = symbol_pool();
        assert_eq!(pool[0], "😀");
        assert_eq!(pool[20], "🪐");
        assert_eq!(pool[21], "一");
        // "好" appears in BASE_SYMBOLS and again in EXTENDED_SYMBOLS
        assert_eq!(pool.iter().filter(|s| s.as_str() == "好").count(), 1);
        assert_eq!(pool[SYMBOL_COUNT - 1], "★");
    }

    #[test]
    fn pool_is_built_once() {
        assert!(std::ptr::eq(symbol_pool(), symbol_pool()));
    }

    #[test]
    fn short_curated_sets_fall_back_to_unicode_ranges() {
        let pool = build_pool(&["abc"]);
        assert_eq!(pool.len(), SYMBOL_COUNT);
        assert_eq!(&pool[..3], &["a", "b", "c"]);
        assert_eq!(pool[3], "\u{2000}");
    }

    #[test]
    fn fallback_skips_duplicates() {
        let pool = build_pool(&["\u{2000}\u{2001}"]);
        assert_eq!(pool[0], "\u{2000}");
        assert_eq!(pool[1], "\u{2001}");
        assert_eq!(pool[2], "\u{2002}");
        let unique: HashSet<&String> = pool.iter().collect();
        assert_eq!(unique.len(), SYMBOL_COUNT);
    }

    #[test]
    fn no_symbol_is_whitespace_or_control() {
        assert!(symbol_pool().iter().all(|s| s.chars().all(|c| !c.is_whitespace() && !c.is_control())));
    }
}
