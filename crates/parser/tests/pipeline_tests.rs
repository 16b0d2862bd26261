// ABOUTME: Integration tests for the full bill pipeline over inline markup and HTML fixtures.
// ABOUTME: Covers end-to-end scenarios, stats consistency, and the tagged-text round trip.

use pretty_assertions::assert_eq;
use redline_parser::{
    classify, clean, merge_adjacent, parse_bill, reduce, serialize, split_tagged, word_count,
    BillError, Classification, Segment, Stats,
};
use std::fs;

fn load_fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read fixture {}: {}", path, e))
}

fn classes(segments: &[Segment]) -> Vec<Classification> {
    segments.iter().map(|s| s.classification).collect()
}

fn assert_stats_consistent(segments: &[Segment], stats: &Stats) {
    let tally = |class: Classification| {
        let matching: Vec<&Segment> = segments
            .iter()
            .filter(|s| s.classification == class)
            .collect();
        (
            matching.len(),
            matching.iter().map(|s| word_count(&s.text)).sum::<usize>(),
        )
    };
    assert_eq!((stats.new_count, stats.new_words), tally(Classification::New));
    assert_eq!(
        (stats.deleted_count, stats.deleted_words),
        tally(Classification::Deleted)
    );
}

mod scenarios {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn table_wrapped_cell() {
        let html = "<html><body><table><tr><td><u>added clause</u> existing text <del>removed clause</del></td></tr></table></body></html>";
        let bill = parse_bill(html).unwrap();

        assert_eq!(
            bill.segments,
            vec![
                Segment::new(Classification::New, "added clause"),
                Segment::new(Classification::Unchanged, "existing text"),
                Segment::new(Classification::Deleted, "removed clause"),
            ]
        );
        assert_eq!(
            bill.stats,
            Stats {
                new_count: 1,
                new_words: 2,
                deleted_count: 1,
                deleted_words: 2,
            }
        );
        assert_eq!(
            bill.tagged_text,
            "[NEW] added clause [/NEW] existing text [DELETED] removed clause [/DELETED]"
        );
    }

    #[test]
    fn adjacent_insertions_merge() {
        let bill = parse_bill("<ins>foo</ins><ins>bar</ins>").unwrap();
        assert_eq!(
            bill.segments,
            vec![Segment::new(Classification::New, "foo bar")]
        );
        assert_eq!(bill.stats.new_count, 1);
    }

    #[test]
    fn plain_paragraph_has_no_formatting() {
        let err = parse_bill("<p>plain text</p>").unwrap_err();
        assert_eq!(err, BillError::NoFormattingDetected);
    }

    #[test]
    fn unmarked_styles_and_classes_have_no_formatting() {
        let html = r#"<div class="bill"><span style="font-weight:bold" class="emphasis">bold</span> <b>b</b> <em>e</em></div>"#;
        assert!(parse_bill(html).unwrap_err().is_no_formatting());
    }

    #[test]
    fn empty_document_has_no_formatting() {
        assert!(parse_bill("").unwrap_err().is_no_formatting());
    }

    #[test]
    fn same_class_merges_across_paragraphs() {
        let bill = parse_bill("<p><u>end of one</u></p>\n<p><u>start of two</u></p>").unwrap();
        assert_eq!(
            bill.segments,
            vec![Segment::new(Classification::New, "end of one start of two")]
        );
    }

    #[test]
    fn printed_page_artifacts_are_stripped() {
        let html = "<html><body><p>
1 Section 5. The Vehicle Code is amended
2 by changing Section 10 as follows:
3 (a) A person <u>shall not</u> <s>may</s> park
SB1234 - 2 - LRB104 01234 ABC 01234 b
4 in a marked space.
</p></body></html>";
        let bill = parse_bill(html).unwrap();
        assert_eq!(
            bill.tagged_text,
            "Section 5. The Vehicle Code is amended by changing Section 10 as follows: (a) A person [NEW] shall not [/NEW] [DELETED] may [/DELETED] park in a marked space."
        );
    }

    #[test]
    fn encoded_markup_is_decoded_before_parsing() {
        let bill = parse_bill("<p>&lt;u&gt;encoded&lt;/u&gt; rest</p>").unwrap();
        assert_eq!(
            bill.segments,
            vec![
                Segment::new(Classification::New, "encoded"),
                Segment::new(Classification::Unchanged, "rest"),
            ]
        );
    }

    #[test]
    fn windows_1252_references_in_word_exports() {
        let bill = parse_bill("<p><u>a&#150;b</u> rest &#147;quoted&#148;</p>").unwrap();
        assert_eq!(
            bill.segments,
            vec![
                Segment::new(Classification::New, "a\u{2013}b"),
                Segment::new(Classification::Unchanged, "rest \u{201C}quoted\u{201D}"),
            ]
        );
    }

    #[test]
    fn deeply_nested_spans_parse() {
        let depth = 100_000;
        let html = format!(
            "{}<u>x</u>{}",
            "<span>".repeat(depth),
            "</span>".repeat(depth)
        );
        let bill = parse_bill(&html).unwrap();
        assert_eq!(bill.tagged_text, "[NEW] x [/NEW]");
        assert_eq!(bill.stats.new_words, 1);
    }
}

mod fixtures {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sb3980_excerpt() {
        let bill = parse_bill(&load_fixture("sb3980_excerpt.html")).unwrap();

        assert_eq!(
            &bill.segments[..3],
            &[
                Segment::new(
                    Classification::Unchanged,
                    "Sec. 25. Residential requirements. (a) All"
                ),
                Segment::new(
                    Classification::Deleted,
                    "building permits issued 90 days after the effective date of this Act shall require a"
                ),
                Segment::new(Classification::New, "new or altered"),
            ]
        );
        assert_eq!(
            bill.segments.last(),
            Some(&Segment::new(
                Classification::New,
                ", including in cases in which a commercial property"
            ))
        );
        assert_eq!(bill.stats.new_count, 6);
        assert_eq!(bill.stats.deleted_count, 4);
        assert_eq!(bill.stats.deleted_words, 26);
        assert_stats_consistent(&bill.segments, &bill.stats);
    }
}

mod properties {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLES: &[&str] = &[
        "<p>a <u>b</u> c</p>",
        "<del>x <ins>y</ins> z</del> tail",
        "<table><tr><td><s>one</s></td><td><s>two</s></td></tr></table>",
        r#"<span class="inserted">i</span><span style="text-decoration: line-through">d</span> u"#,
        "<u>a</u> <u>b</u> c <del>d</del> <del>e</del>",
    ];

    #[test]
    fn inheritance_without_override() {
        let segments = classify("<div><u><p><span>one</span><em>two</em></p></u></div>").unwrap();
        assert!(!segments.is_empty());
        assert!(segments
            .iter()
            .all(|s| s.classification == Classification::New));
    }

    #[test]
    fn reduced_output_has_no_adjacent_duplicates() {
        for html in SAMPLES {
            let bill = parse_bill(html).unwrap();
            assert_eq!(merge_adjacent(bill.segments.clone()), bill.segments);
            assert!(bill
                .segments
                .windows(2)
                .all(|pair| pair[0].classification != pair[1].classification));
        }
    }

    #[test]
    fn stats_match_segments() {
        for html in SAMPLES {
            let bill = parse_bill(html).unwrap();
            assert_stats_consistent(&bill.segments, &bill.stats);
        }
    }

    #[test]
    fn segments_are_trimmed_and_non_empty() {
        for html in SAMPLES {
            let bill = parse_bill(html).unwrap();
            for segment in &bill.segments {
                assert!(!segment.text.is_empty());
                assert_eq!(segment.text.trim(), segment.text);
                assert!(!segment.text.contains("  "));
            }
        }
    }

    #[test]
    fn tagged_text_round_trips() {
        for html in SAMPLES {
            let bill = parse_bill(html).unwrap();
            let recovered = split_tagged(&bill.tagged_text);
            assert_eq!(classes(&recovered), classes(&bill.segments));
            assert_eq!(recovered, bill.segments);
        }
    }

    #[test]
    fn stages_compose_like_parse_bill() {
        let html = SAMPLES[1];
        let reduced = reduce(classify(&clean(html)).unwrap()).unwrap();
        let bill = parse_bill(html).unwrap();
        assert_eq!(reduced.segments, bill.segments);
        assert_eq!(serialize(&reduced.segments), bill.tagged_text);
    }
}
