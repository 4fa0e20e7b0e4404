//! Integration Tests
//!
//! End-to-end engine workflows: full message analysis, conversation
//! analysis, the caller-facing error surface, lexicon overrides loaded from
//! disk and localized severity descriptions.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::{EmbedderKind, TriageConfig};
use crate::error::{AppError, GENERIC_FAILURE_MESSAGE};
use crate::triage::{
    lexicon::{
        LexiconAssets, DISORDERS_FILE, SENTIMENT_FILE, STOPWORDS_FILE, SYMPTOMS_FILE,
        SYNONYMS_FILE, THESAURUS_FILE, VOCABULARY_FILE,
    },
    FindingStrength, TriageContext, TriageEngine,
};

fn engine() -> TriageEngine {
    TriageEngine::new(TriageContext::shared_for_tests())
}

/// Writes the bundled lexicon into `dir`, with `disorders` replacing the
/// bundled disorder table when given.
fn write_lexicon(dir: &Path, disorders: Option<&str>) {
    let assets = LexiconAssets::embedded();
    let files = [
        (SYMPTOMS_FILE, assets.symptoms.as_str()),
        (DISORDERS_FILE, disorders.unwrap_or(assets.disorders.as_str())),
        (SYNONYMS_FILE, assets.synonyms.as_str()),
        (THESAURUS_FILE, assets.thesaurus.as_str()),
        (STOPWORDS_FILE, assets.stopwords.as_str()),
        (VOCABULARY_FILE, assets.vocabulary.as_str()),
        (SENTIMENT_FILE, assets.sentiment.as_str()),
    ];
    for (name, contents) in files {
        fs::write(dir.join(name), contents).unwrap();
    }
}

const BURNOUT_DISORDERS: &str = r#"{
  "version": "1",
  "disorders": [
    { "name": "Burnout", "symptoms": ["fatigue", "sleep_disturbance"], "treatments": ["rest", "workload review"] }
  ]
}"#;

#[cfg(test)]
mod analysis_tests {
    use super::*;

    #[test]
    fn test_full_report_for_distressed_message() {
        let report = engine()
            .analyze("I'm so tired and I can't sleep, I feel hopeless")
            .unwrap();

        assert!(!report.analysis_id.is_empty());
        assert!(report.has_findings());
        assert!(
            report.extracted_symptoms.contains("Fatigue"),
            "{:?}",
            report.extracted_symptoms
        );
        assert!(report.extracted_symptoms.contains("Sleep Disturbance"));
        assert!(report.disorder_scores.contains_key("depression"));
        assert!(report
            .disorder_scores
            .values()
            .all(|p| *p > 0.0 && *p <= 100.0));
    }

    #[test]
    fn test_good_news_yields_no_findings() {
        let report = engine()
            .analyze("I finally got hired at the new company")
            .unwrap();

        assert!(
            report.extracted_symptoms.is_empty(),
            "{:?}",
            report.extracted_symptoms
        );
        assert!(report.disorder_scores.is_empty());
    }

    #[test]
    fn test_surfaced_entries_and_severity_agree() {
        let messages = [
            "I can't sleep at night",
            "My heart is racing and I can't breathe",
            "The weather is nice today",
            "I keep hearing voices",
        ];
        let engine = engine();
        for text in messages {
            let report = engine.analyze(text).unwrap();
            for detected in &report.detected_symptoms {
                assert!(detected.confidence.overall > 0.3, "{}", text);
            }
            assert_eq!(
                report.severity_assessment.is_some(),
                !report.detected_symptoms.is_empty(),
                "{}",
                text
            );
            if let Some(severity) = &report.severity_assessment {
                let max = report
                    .detected_symptoms
                    .iter()
                    .map(|d| d.confidence.overall)
                    .fold(f32::MIN, f32::max);
                assert!((report.confidence_scores.max_confidence - max).abs() < 1e-6);
                assert_eq!(severity.description.len(), 3);
            }
        }
    }

    #[test]
    fn test_report_serializes_with_public_field_names() {
        let report = engine()
            .with_surface_threshold(0.0)
            .analyze("I can't sleep")
            .unwrap();
        let value = serde_json::to_value(&report).unwrap();

        assert!(value["analysis_id"].is_string());
        assert!(value["sentiment"]["sentiment"].is_string());
        assert!(value["sentiment"]["intensity"].is_number());
        assert!(value["sentiment"]["scores"]["compound"].is_number());
        assert!(value["confidence_scores"]["max_confidence"].is_number());
        assert!(value["processing_time_ms"].is_u64());

        let first = &value["detected_symptoms"][0];
        assert!(first["symptom"].is_string());
        assert!(first["disorder"].is_string());
        assert!(first["confidence"]["overall_confidence"].is_number());
        assert!(first["confidence"]["semantic_similarity"].is_number());
        assert!(first["confidence"]["fuzzy_match"].is_number());

        let level = value["severity_assessment"]["level"].as_str().unwrap();
        assert!(["mild", "moderate", "severe"].contains(&level));
        let description = &value["severity_assessment"]["description"];
        assert!(description["en"].is_string());
    }

    #[test]
    fn test_summary_mentions_severity() {
        let report = engine()
            .with_surface_threshold(0.0)
            .analyze("I can't sleep")
            .unwrap();
        let level = report.severity_assessment.as_ref().unwrap().level;
        assert!(report.summary().contains(&format!("severity={}", level)));
    }
}

#[cfg(test)]
mod error_surface_tests {
    use super::*;

    #[test]
    fn test_blank_message_is_invalid_input() {
        let err = engine().analyze("  \n\t ").unwrap_err();
        assert!(err.is_client_error());
        let public = err.to_public();
        assert_eq!(public.message, "Message text cannot be empty");
        assert_eq!(
            serde_json::to_value(&public).unwrap()["kind"],
            "invalid_input"
        );
    }

    #[test]
    fn test_length_limit_counts_characters() {
        let engine = engine();
        let err = engine.analyze(&"a".repeat(5001)).unwrap_err();
        assert_eq!(
            err.public_message(),
            "Message text is too long. Maximum length is 5000 characters"
        );
        // Multi-byte characters count once each.
        assert!(engine.analyze(&"é".repeat(5000)).is_ok());
    }

    #[test]
    fn test_configured_limit_lowers_the_bound() {
        let engine = engine().with_max_input_chars(10);
        let err = engine.analyze("I can't sleep at all").unwrap_err();
        assert!(err.public_message().contains("10 characters"));
    }

    #[test]
    fn test_internal_errors_stay_generic() {
        let err = AppError::ExternalService("model at /opt/models crashed".to_string());
        let public = err.to_public();
        assert_eq!(public.message, GENERIC_FAILURE_MESSAGE);
        assert!(!public.message.contains("/opt/models"));
    }

    #[test]
    fn test_empty_conversation_is_rejected() {
        let err = engine()
            .analyze_conversation(&["".to_string(), "   ".to_string()])
            .unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(
            err.public_message(),
            "Conversation must contain at least one response"
        );
    }
}

#[cfg(test)]
mod conversation_tests {
    use super::*;

    #[test]
    fn test_conversation_findings_are_reported_strongest_first() {
        let responses = vec![
            "I'm so tired and I can't sleep".to_string(),
            "".to_string(),
            "I feel sad and hopeless".to_string(),
        ];
        let report = engine().analyze_conversation(&responses).unwrap();

        assert_eq!(report.response_count, 2);
        assert!(!report.findings.is_empty());
        assert!(report.findings.iter().any(|f| f.disorder == "depression"));
        for finding in &report.findings {
            assert!(finding.confidence > 30.0);
            assert_eq!(
                report.disorder_scores[&finding.disorder],
                finding.confidence
            );
        }
        assert!(report
            .findings
            .windows(2)
            .all(|w| w[0].confidence >= w[1].confidence));
    }

    #[test]
    fn test_unrelated_conversation_has_no_findings() {
        let responses = vec!["The quarterly report is due on Friday".to_string()];
        let report = engine().analyze_conversation(&responses).unwrap();
        assert!(report.extracted_symptoms.is_empty());
        assert!(report.findings.is_empty());
    }
}

#[cfg(test)]
mod lexicon_override_tests {
    use super::*;

    fn config_for(dir: &Path) -> TriageConfig {
        TriageConfig {
            lexicon_dir: Some(dir.to_path_buf()),
            embedder: EmbedderKind::Hashed,
            ..TriageConfig::default()
        }
    }

    #[test]
    fn test_directory_lexicon_replaces_bundled_one() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_lexicon(temp_dir.path(), Some(BURNOUT_DISORDERS));

        let engine = TriageEngine::from_config(&config_for(temp_dir.path())).unwrap();
        assert_eq!(engine.context().lexicon().disorders().len(), 1);

        let report = engine
            .analyze_conversation(&["I'm so tired and I can't sleep".to_string()])
            .unwrap();
        assert_eq!(report.disorder_scores.len(), 1);
        assert_eq!(report.disorder_scores["burnout"], 100.0);

        let finding = &report.findings[0];
        assert_eq!(finding.disorder, "burnout");
        assert_eq!(finding.strength, FindingStrength::Significant);
        assert_eq!(finding.treatments, vec!["rest", "workload review"]);
    }

    #[test]
    fn test_missing_lexicon_file_fails_startup() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_lexicon(temp_dir.path(), None);
        fs::remove_file(temp_dir.path().join(VOCABULARY_FILE)).unwrap();

        let result = TriageEngine::from_config(&config_for(temp_dir.path()));
        match result {
            Err(AppError::Io(e)) => assert!(e.to_string().contains(VOCABULARY_FILE)),
            Err(other) => panic!("Expected Io error, got {:?}", other),
            Ok(_) => panic!("Expected startup to fail"),
        }
    }

    #[test]
    fn test_wrong_version_is_a_data_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_lexicon(
            temp_dir.path(),
            Some(r#"{"version": "2", "disorders": []}"#),
        );

        let result = TriageEngine::from_config(&config_for(temp_dir.path()));
        assert!(matches!(result, Err(AppError::Data(_))));
    }

    #[test]
    fn test_environment_selects_lexicon_and_embedder() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_lexicon(temp_dir.path(), Some(BURNOUT_DISORDERS));
        let dir = temp_dir.path().to_string_lossy().to_string();

        let config = temp_env::with_vars(
            [
                ("HEADDOWELL_LEXICON_DIR", Some(dir.as_str())),
                ("HEADDOWELL_EMBEDDER", Some("hashed")),
                ("HEADDOWELL_SURFACE_THRESHOLD", Some("0.5")),
                ("HEADDOWELL_MAX_INPUT_CHARS", None),
                ("HEADDOWELL_TRANSLATE_URL", None),
            ],
            TriageConfig::from_env,
        )
        .unwrap();

        assert_eq!(config.embedder, EmbedderKind::Hashed);
        let engine = TriageEngine::from_config(&config).unwrap();
        assert_eq!(engine.context().embedder().name(), "hashed-bow");
        assert!(engine.context().lexicon().disorder("burnout").is_some());

        let report = engine.analyze("I can't sleep").unwrap();
        for detected in &report.detected_symptoms {
            assert!(detected.confidence.overall > 0.5);
            assert_eq!(detected.disorder, "burnout");
        }
    }

    #[test]
    fn test_contexts_from_same_assets_agree() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_lexicon(temp_dir.path(), None);

        let from_disk = TriageEngine::from_config(&config_for(temp_dir.path())).unwrap();
        let bundled = TriageEngine::new(Arc::clone(&TriageContext::shared_for_tests()));

        let text = "I don't enjoy anything anymore and I feel worthless";
        let a = from_disk.analyze(text).unwrap();
        let b = bundled.analyze(text).unwrap();
        assert_eq!(a.extracted_symptoms, b.extracted_symptoms);
        assert_eq!(a.disorder_scores, b.disorder_scores);
        assert_eq!(a.detected_symptoms, b.detected_symptoms);
    }
}

#[cfg(test)]
mod localization_tests {
    use super::*;
    use crate::translation::HttpTranslator;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_severity_description_in_unbundled_language() {
        // 1. Arrange
        let report = engine()
            .with_surface_threshold(0.0)
            .analyze("I can't sleep")
            .unwrap();
        let severity = report.severity_assessment.unwrap();
        let english = severity.description("en").to_string();

        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .and(body_partial_json(json!({"q": english, "target": "de"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"translatedText": "Übersetzt"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
        let translator =
            HttpTranslator::new(&Url::parse(&mock_server.uri()).unwrap(), None).unwrap();

        // 2. Act
        let german = severity.description_in("de", &translator).await;
        let french = severity.description_in("fr", &translator).await;

        // 3. Assert
        assert_eq!(german, "Übersetzt");
        assert_eq!(french, severity.description("fr"));
        assert_ne!(french, english);
    }

    #[tokio::test]
    async fn test_unreachable_translator_falls_back_to_english() {
        let report = engine()
            .with_surface_threshold(0.0)
            .analyze("I can't sleep")
            .unwrap();
        let severity = report.severity_assessment.unwrap();

        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&mock_server)
            .await;
        let translator =
            HttpTranslator::new(&Url::parse(&mock_server.uri()).unwrap(), None).unwrap();

        let text = severity.description_in("ja", &translator).await;
        assert_eq!(text, severity.description("en"));
    }
}
