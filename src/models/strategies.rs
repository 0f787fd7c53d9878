// 测试用的 proptest 生成器

use proptest::prelude::*;

use super::{Collection, Entry, Rarity, SnowmanStats};

pub fn arb_rarity() -> impl Strategy<Value = Rarity> {
    prop::sample::select(Rarity::ALL.to_vec())
}

pub fn arb_stats() -> impl Strategy<Value = SnowmanStats> {
    (
        any::<i32>(),
        any::<i32>(),
        any::<i32>(),
        any::<i32>(),
        any::<i32>(),
    )
        .prop_map(
            |(creativity, roundness, accessories, chill_factor, durability)| SnowmanStats {
                creativity,
                roundness,
                accessories,
                chill_factor,
                durability,
            },
        )
}

/// 类型：常见类别（便于出现重复）与任意 Unicode 文本混合
pub fn arb_kind() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(vec![
            "클래식", "진흙", "추상적", "꼬마", "Classic", "classic", "클래식 ",
        ])
        .prop_map(|kind| kind.to_string()),
        "\\PC{0,12}",
    ]
}

/// 贴纸：缺失或非空文本
pub fn arb_sticker() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop_oneof!["[A-Za-z0-9+/]{1,24}={0,2}", "\\PC{1,8}"])
}

pub fn arb_entry() -> impl Strategy<Value = Entry> {
    (
        "[0-9]{1,13}-[0-9a-f]{8}",
        "\\PC{0,16}",
        "\\PC{0,32}",
        arb_kind(),
        arb_rarity(),
        arb_stats(),
        "\\PC{0,32}",
        "data:image/(jpeg|png);base64,[A-Za-z0-9+/]{0,24}",
        arb_sticker(),
        any::<i64>(),
    )
        .prop_map(
            |(
                id,
                name,
                description,
                kind,
                rarity,
                stats,
                fun_fact,
                image_url,
                sticker_url,
                timestamp,
            )| Entry {
                id,
                name,
                description,
                kind,
                rarity,
                stats,
                fun_fact,
                image_url,
                sticker_url,
                timestamp,
            },
        )
}

pub fn arb_collection() -> impl Strategy<Value = Collection> {
    prop::collection::vec(arb_entry(), 0..16)
}
