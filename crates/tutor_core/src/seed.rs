//! crates/tutor_core/src/seed.rs
//!
//! The sample scenarios written into an empty catalogue.

use crate::domain::{ExamplePhrase, GrammarPoint, Level, ScenarioRecord, VocabularyItem};

fn phrase(source_text: &str, translated_text: &str) -> ExamplePhrase {
    ExamplePhrase {
        source_text: source_text.to_string(),
        translated_text: translated_text.to_string(),
    }
}

fn term(term: &str, definition: &str, example_sentence: &str) -> VocabularyItem {
    VocabularyItem {
        term: term.to_string(),
        definition: definition.to_string(),
        example_sentence: example_sentence.to_string(),
    }
}

fn grammar(point_name: &str, explanation: &str, example_sentence: &str) -> GrammarPoint {
    GrammarPoint {
        point_name: point_name.to_string(),
        explanation: explanation.to_string(),
        example_sentence: example_sentence.to_string(),
    }
}

pub fn sample_scenarios() -> Vec<ScenarioRecord> {
    vec![
        ScenarioRecord {
            id: "cafe_ordering".to_string(),
            title: "Ordering at a café".to_string(),
            description: "Basic exchanges for ordering drinks and snacks at a café.".to_string(),
            level: Level::Beginner,
            theme: "daily_life".to_string(),
            example_phrases: vec![
                phrase("I'd like a cup of coffee, please.", "コーヒーを一杯ください。"),
                phrase("Could I have a latte with soy milk?", "豆乳ラテをお願いできますか？"),
                phrase("Do you have any recommendations?", "何かおすすめはありますか？"),
                phrase("Is this to stay or to go?", "こちらでお召し上がりですか、お持ち帰りですか？"),
            ],
            key_vocabulary: vec![
                term("order", "注文する", "I'd like to order a sandwich."),
                term("recommendation", "おすすめ", "What's your recommendation?"),
                term("size", "サイズ", "What size would you like?"),
                term("menu", "メニュー", "Could I see the menu, please?"),
            ],
            grammar_points: vec![
                grammar(
                    "I'd like ~ (I would like ~)",
                    "丁寧な注文や要望を伝える表現",
                    "I'd like a glass of water, please.",
                ),
                grammar("Could I have ~?", "丁寧な依頼表現", "Could I have the bill, please?"),
                grammar(
                    "Do you have ~?",
                    "所有や提供の有無を尋ねる表現",
                    "Do you have any vegetarian options?",
                ),
            ],
        },
        ScenarioRecord {
            id: "business_meeting".to_string(),
            title: "Speaking up in a business meeting".to_string(),
            description: "Expressions for sharing opinions and making proposals in meetings."
                .to_string(),
            level: Level::Intermediate,
            theme: "business".to_string(),
            example_phrases: vec![
                phrase(
                    "I'd like to share my thoughts on this matter.",
                    "この件について私の考えを共有したいと思います。",
                ),
                phrase(
                    "Based on our data, I believe we should focus on...",
                    "データに基づくと、私たちは...に集中すべきだと考えます。",
                ),
                phrase(
                    "Could you elaborate on that point?",
                    "その点についてもう少し詳しく説明していただけますか？",
                ),
                phrase(
                    "I see your point, but I have a different perspective.",
                    "あなたの意見は理解できますが、私は異なる視点を持っています。",
                ),
            ],
            key_vocabulary: vec![
                term("proposal", "提案", "I have a proposal for the new project."),
                term(
                    "perspective",
                    "視点、観点",
                    "From my perspective, this approach has several advantages.",
                ),
                term("agenda", "議題", "Let's move to the next item on our agenda."),
                term("consensus", "合意", "We need to reach a consensus on this issue."),
            ],
            grammar_points: vec![
                grammar(
                    "I believe that ~",
                    "自分の意見を丁寧に述べる表現",
                    "I believe that this strategy will yield better results.",
                ),
                grammar(
                    "Could you + verb",
                    "丁寧な依頼表現",
                    "Could you provide more details about the timeline?",
                ),
                grammar(
                    "I see your point, but ~",
                    "相手の意見を認めつつ異なる見解を示す表現",
                    "I see your point, but we need to consider the costs as well.",
                ),
            ],
        },
        ScenarioRecord {
            id: "hotel_checkin".to_string(),
            title: "Checking in at a hotel".to_string(),
            description: "Conversations about checking in and asking about the room.".to_string(),
            level: Level::Beginner,
            theme: "travel".to_string(),
            example_phrases: vec![
                phrase(
                    "I have a reservation under the name Johnson.",
                    "ジョンソンという名前で予約しています。",
                ),
                phrase("What time is check-out?", "チェックアウトは何時ですか？"),
                phrase("Is breakfast included in the rate?", "朝食は料金に含まれていますか？"),
                phrase(
                    "Do you have a room with a better view?",
                    "もっと景色の良い部屋はありますか？",
                ),
            ],
            key_vocabulary: vec![
                term("reservation", "予約", "I made a reservation online."),
                term("check-in", "チェックイン", "The check-in time is 3:00 PM."),
                term("amenities", "アメニティ", "The room comes with all standard amenities."),
                term(
                    "concierge",
                    "コンシェルジュ",
                    "You can ask the concierge for restaurant recommendations.",
                ),
            ],
            grammar_points: vec![
                grammar(
                    "I have a ~ under the name",
                    "予約の確認表現",
                    "I have a booking under the name Smith.",
                ),
                grammar(
                    "Is ~ included in ~?",
                    "包含関係を問う表現",
                    "Is Wi-Fi included in the room rate?",
                ),
                grammar(
                    "Do you have ~?",
                    "所有や利用可能性を尋ねる表現",
                    "Do you have a gym in this hotel?",
                ),
            ],
        },
    ]
}
