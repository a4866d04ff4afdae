use domain::text_splitter::{stitch, RecursiveTextSplitter};
use proptest::prelude::*;

fn fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-z]{1,12}",
        1 => Just(" ".to_string()),
        1 => Just("\n".to_string()),
        1 => Just("\n\n".to_string()),
        1 => "[äöü✨日本]{1,4}",
    ]
}

fn document() -> impl Strategy<Value = String> {
    prop::collection::vec(fragment(), 0..80).prop_map(|parts| parts.concat())
}

fn splitter() -> impl Strategy<Value = RecursiveTextSplitter> {
    (1usize..60).prop_flat_map(|size| (Just(size), 0..size))
        .prop_map(|(size, overlap)| RecursiveTextSplitter::new(size, overlap))
}

proptest! {
    #[test]
    fn chunks_respect_the_size_limit(text in document(), splitter in splitter()) {
        for chunk in splitter.split(&text) {
            prop_assert!(chunk.char_len() <= splitter.chunk_size(), "{:?}", chunk);
        }
    }

    #[test]
    fn neighbours_overlap_by_at_most_the_configured_amount(text in document(), splitter in splitter()) {
        let chunks = splitter.split(&text);
        for pair in chunks.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            prop_assert!(next.start >= prev.start && next.end > prev.end);
            if next.start < prev.end {
                let shared = text[next.start..prev.end].chars().count();
                prop_assert!(shared <= splitter.chunk_overlap());
            }
        }
    }

    #[test]
    fn stitching_reconstructs_the_source(text in document(), splitter in splitter()) {
        let chunks = splitter.split(&text);
        prop_assert_eq!(stitch(&chunks), text.clone());
        for chunk in &chunks {
            prop_assert_eq!(&text[chunk.start..chunk.end], chunk.text.as_str());
        }
    }

    #[test]
    fn splitting_twice_gives_the_same_chunks(text in document(), splitter in splitter()) {
        prop_assert_eq!(splitter.split(&text), splitter.split(&text));
    }
}

#[test]
fn default_settings_bound_a_long_profile() {
    let paragraph = "Uday Raj is a software engineer who built a chatbot project. ".repeat(30);
    let text = format!("{paragraph}\n\n{paragraph}");
    let splitter = RecursiveTextSplitter::default();
    let chunks = splitter.split(&text);

    assert!(chunks.len() > 2);
    assert!(chunks.iter().all(|c| c.char_len() <= 500));
    assert_eq!(stitch(&chunks), text);
}
