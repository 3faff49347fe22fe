//! API functions for the Discussions module
//!
//! `derive_contexts` is the pure core: outline + settings in, ordered
//! contexts out. The remaining functions resolve inputs from the module
//! state and are called by the canister's endpoint handlers in lib.rs.

use super::error::DiscussionsError;
use super::hash::contexts_fingerprint;
use super::state::{with_discussions_state, with_discussions_state_mut};
use super::types::*;
use super::validation::{
    validate_course_key, validate_outline, validate_outline_course, validate_topics,
};
use crate::types::Timestamp;

// =============================================================================
// Derivation
// =============================================================================

/// Compute every place a discussion thread can be anchored for a course.
///
/// Topic contexts come first with orderings `0..n`, followed by unit
/// contexts in outline order, all at `UNIT_CONTEXT_ORDERING`.
pub fn derive_contexts(
    outline: &CourseOutline,
    settings: &DiscussionSettings,
) -> Result<Vec<DiscussionTopicContext>, DiscussionsError> {
    validate_topics(&settings.topics)?;
    validate_outline(outline)?;

    let mut contexts: Vec<DiscussionTopicContext> = settings
        .topics
        .iter()
        .enumerate()
        .map(|(index, topic)| DiscussionTopicContext {
            title: topic.title.clone(),
            usage_key: None,
            group_id: None,
            external_id: topic.id.clone(),
            ordering: index as u32,
            context: None,
        })
        .collect();

    if !settings.enable_in_context {
        return Ok(contexts);
    }

    for section in &outline.sections {
        for subsection in &section.subsections {
            for unit in &subsection.units {
                if !unit_is_discussable(settings, subsection.graded, unit) {
                    continue;
                }
                contexts.push(DiscussionTopicContext {
                    title: unit.display_name.clone(),
                    usage_key: Some(unit.usage_key.clone()),
                    group_id: None,
                    external_id: None,
                    ordering: UNIT_CONTEXT_ORDERING,
                    context: Some(ContextAncestry {
                        section: section.display_name.clone(),
                        subsection: subsection.display_name.clone(),
                        unit: unit.display_name.clone(),
                    }),
                });
            }
        }
    }

    Ok(contexts)
}

/// Visibility predicate for a single unit.
///
/// Graded units are governed by `enable_graded_units` alone; the
/// unit-level visibility switch only gates ungraded units.
pub fn unit_is_discussable(settings: &DiscussionSettings, graded: bool, unit: &OutlineUnit) -> bool {
    if !unit.discussion_enabled {
        return false;
    }
    if graded {
        settings.enable_graded_units
    } else {
        settings.unit_level_visibility
    }
}

// =============================================================================
// Outline & Settings Operations
// =============================================================================

/// Store the resolved outline for its course, replacing any previous one
pub fn set_course_outline(outline: CourseOutline) -> Result<(), DiscussionsError> {
    validate_outline(&outline)?;

    with_discussions_state_mut(|state| {
        state.outlines.insert(outline.course_key.clone(), outline);
    });

    Ok(())
}

/// Merge a partial update into a course's settings and return the result
pub fn update_course_discussion_settings(
    course_key: &str,
    update: DiscussionSettingsUpdate,
) -> Result<DiscussionSettings, DiscussionsError> {
    validate_course_key(course_key)?;
    if let Some(ref topics) = update.topics {
        validate_topics(topics)?;
    }

    with_discussions_state_mut(|state| {
        let merged = state.effective_settings(course_key).merged(update);
        state.settings.insert(course_key.to_string(), merged.clone());
        Ok(merged)
    })
}

/// Effective settings for a course
pub fn get_course_discussion_settings(course_key: &str) -> DiscussionSettings {
    with_discussions_state(|state| state.effective_settings(course_key))
}

// =============================================================================
// Configuration Refresh
// =============================================================================

/// Rebuild a course's discussions configuration from its outline and settings.
///
/// The result replaces the stored configuration; `changed` reports whether
/// it differs from the previous one in contexts, provider, flags or plugin
/// configuration.
pub fn update_discussions_settings_from_course(
    course_key: &str,
    now: Timestamp,
) -> Result<CourseDiscussionConfigurationData, DiscussionsError> {
    validate_course_key(course_key)?;

    with_discussions_state_mut(|state| {
        let outline = state
            .get_outline(course_key)
            .ok_or_else(|| DiscussionsError::OutlineNotFound(course_key.to_string()))?;
        validate_outline_course(outline, course_key)?;

        let settings = state.effective_settings(course_key);
        let contexts = derive_contexts(outline, &settings)?;
        let contexts_fingerprint = contexts_fingerprint(&contexts);

        let mut data = CourseDiscussionConfigurationData {
            course_key: course_key.to_string(),
            provider_type: settings.provider_type,
            enable_in_context: settings.enable_in_context,
            enable_graded_units: settings.enable_graded_units,
            unit_level_visibility: settings.unit_level_visibility,
            plugin_configuration: settings.plugin_configuration,
            contexts,
            contexts_fingerprint,
            changed: true,
            derived_at: now,
        };
        data.changed = state
            .get_configuration(course_key)
            .map(|previous| !previous.same_content_as(&data))
            .unwrap_or(true);

        state.configurations.insert(course_key.to_string(), data.clone());
        Ok(data)
    })
}

/// Last derived configuration for a course
pub fn get_discussions_configuration(course_key: &str) -> Option<CourseDiscussionConfigurationData> {
    with_discussions_state(|state| state.get_configuration(course_key).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    const COURSE: &str = "course-v1:edX+DemoX+2024";
    const SETTINGS_COURSE: &str = "course-v1:edX+Settings+2024";
    const BAD_TOPICS_COURSE: &str = "course-v1:edX+BadTopics+2024";
    const PROVIDER_COURSE: &str = "course-v1:edX+Provider+2024";

    /// Section with an ungraded and a graded sequence, three units each
    fn reference_outline() -> CourseOutline {
        CourseOutline {
            course_key: COURSE.to_string(),
            sections: vec![OutlineSection {
                usage_key: "block-v1:chapter+section".to_string(),
                display_name: "Section".to_string(),
                subsections: vec![
                    OutlineSubsection {
                        usage_key: "block-v1:sequential+sequence".to_string(),
                        display_name: "Sequence".to_string(),
                        graded: false,
                        units: vec![
                            OutlineUnit::new("block-v1:vertical+unit", "Unit"),
                            OutlineUnit::new("block-v1:vertical+discussable", "Discussable Unit")
                                .with_discussion_enabled(true),
                            OutlineUnit::new("block-v1:vertical+non-discussable", "Non-Discussable Unit")
                                .with_discussion_enabled(false),
                        ],
                    },
                    OutlineSubsection {
                        usage_key: "block-v1:sequential+graded".to_string(),
                        display_name: "Graded Sequence".to_string(),
                        graded: true,
                        units: vec![
                            OutlineUnit::new("block-v1:vertical+graded-unit", "Graded Unit"),
                            OutlineUnit::new(
                                "block-v1:vertical+discussable-graded",
                                "Discussable Graded Unit",
                            )
                            .with_discussion_enabled(true),
                            OutlineUnit::new(
                                "block-v1:vertical+non-discussable-graded",
                                "Non-Discussable Graded Unit",
                            )
                            .with_discussion_enabled(false),
                        ],
                    },
                ],
            }],
        }
    }

    fn titles(contexts: &[DiscussionTopicContext]) -> BTreeSet<String> {
        contexts.iter().map(|c| c.title.clone()).collect()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn settings_with(update: DiscussionSettingsUpdate) -> DiscussionSettings {
        DiscussionSettings::default().merged(update)
    }

    #[test]
    fn test_default_settings() {
        let settings = DiscussionSettings::default();
        assert!(settings.enable_in_context);
        assert!(!settings.enable_graded_units);
        assert!(settings.unit_level_visibility);
        assert_eq!(settings.provider_type, DEFAULT_PROVIDER_TYPE);
        assert!(settings.plugin_configuration.is_empty());

        let contexts = derive_contexts(&reference_outline(), &settings).unwrap();
        assert_eq!(titles(&contexts), set(&["General", "Unit", "Discussable Unit"]));
        assert_eq!(contexts.len(), 3);
    }

    #[test]
    fn test_topics_contexts() {
        let settings = settings_with(DiscussionSettingsUpdate {
            topics: Some(vec![
                DiscussionTopic::new("General", "general-topic"),
                DiscussionTopic::new("Test Topic", "test-topic"),
            ]),
            ..Default::default()
        });

        let contexts = derive_contexts(&reference_outline(), &settings).unwrap();
        assert_eq!(contexts.len(), 4);
        assert!(contexts.contains(&DiscussionTopicContext {
            title: "General".to_string(),
            usage_key: None,
            group_id: None,
            external_id: Some("general-topic".to_string()),
            ordering: 0,
            context: None,
        }));
        assert!(contexts.contains(&DiscussionTopicContext {
            title: "Test Topic".to_string(),
            usage_key: None,
            group_id: None,
            external_id: Some("test-topic".to_string()),
            ordering: 1,
            context: None,
        }));
        assert!(contexts.contains(&DiscussionTopicContext {
            title: "Unit".to_string(),
            usage_key: Some("block-v1:vertical+unit".to_string()),
            group_id: None,
            external_id: None,
            ordering: UNIT_CONTEXT_ORDERING,
            context: Some(ContextAncestry {
                section: "Section".to_string(),
                subsection: "Sequence".to_string(),
                unit: "Unit".to_string(),
            }),
        }));
    }

    #[test]
    fn test_in_context_disabled_returns_topics_only() {
        for (graded, unit_level) in [(false, false), (false, true), (true, false), (true, true)] {
            let settings = settings_with(DiscussionSettingsUpdate {
                enable_in_context: Some(false),
                enable_graded_units: Some(graded),
                unit_level_visibility: Some(unit_level),
                ..Default::default()
            });
            let contexts = derive_contexts(&reference_outline(), &settings).unwrap();
            assert_eq!(contexts.len(), settings.topics.len());
            assert!(contexts.iter().all(|c| c.usage_key.is_none()));
        }
    }

    #[test]
    fn test_custom_discussion_settings() {
        let cases: Vec<(DiscussionSettingsUpdate, usize, Vec<&str>, Vec<&str>)> = vec![
            (
                DiscussionSettingsUpdate::default(),
                3,
                vec!["Unit", "Discussable Unit"],
                vec![
                    "Graded Unit",
                    "Non-Discussable Unit",
                    "Discussable Graded Unit",
                    "Non-Discussable Graded Unit",
                ],
            ),
            (
                DiscussionSettingsUpdate {
                    enable_in_context: Some(false),
                    ..Default::default()
                },
                1,
                vec![],
                vec!["Unit", "Graded Unit"],
            ),
            (
                DiscussionSettingsUpdate {
                    unit_level_visibility: Some(false),
                    enable_graded_units: Some(false),
                    ..Default::default()
                },
                1,
                vec![],
                vec!["Unit", "Discussable Unit", "Graded Unit"],
            ),
            (
                DiscussionSettingsUpdate {
                    unit_level_visibility: Some(false),
                    enable_graded_units: Some(true),
                    ..Default::default()
                },
                3,
                vec!["Graded Unit", "Discussable Graded Unit"],
                vec!["Unit", "Discussable Unit", "Non-Discussable Graded Unit"],
            ),
            (
                DiscussionSettingsUpdate {
                    enable_graded_units: Some(true),
                    ..Default::default()
                },
                5,
                vec!["Discussable Unit", "Discussable Graded Unit", "Graded Unit"],
                vec!["Non-Discussable Unit", "Non-Discussable Graded Unit"],
            ),
        ];

        for (update, count, present, missing) in cases {
            let settings = settings_with(update.clone());
            let contexts = derive_contexts(&reference_outline(), &settings).unwrap();
            let found = titles(&contexts);
            assert_eq!(contexts.len(), count, "settings {:?}", update);
            assert!(set(&present).is_subset(&found), "settings {:?}", update);
            assert!(set(&missing).is_disjoint(&found), "settings {:?}", update);
        }
    }

    #[test]
    fn test_disabled_ungraded_unit_never_included() {
        for (graded, unit_level) in [(false, false), (false, true), (true, false), (true, true)] {
            let settings = settings_with(DiscussionSettingsUpdate {
                enable_graded_units: Some(graded),
                unit_level_visibility: Some(unit_level),
                ..Default::default()
            });
            let contexts = derive_contexts(&reference_outline(), &settings).unwrap();
            assert!(!titles(&contexts).contains("Non-Discussable Unit"));
        }
    }

    #[test]
    fn test_graded_inclusion_ignores_unit_level_visibility() {
        for graded in [false, true] {
            let mut results = Vec::new();
            for unit_level in [false, true] {
                let settings = settings_with(DiscussionSettingsUpdate {
                    enable_graded_units: Some(graded),
                    unit_level_visibility: Some(unit_level),
                    ..Default::default()
                });
                let contexts = derive_contexts(&reference_outline(), &settings).unwrap();
                results.push(titles(&contexts).contains("Discussable Graded Unit"));
            }
            assert_eq!(results, vec![graded, graded]);
        }
    }

    #[test]
    fn test_topics_precede_units_in_traversal_order() {
        let settings = settings_with(DiscussionSettingsUpdate {
            enable_graded_units: Some(true),
            topics: Some(vec![
                DiscussionTopic::new("General", "general-topic"),
                DiscussionTopic::new("Test Topic", "test-topic"),
            ]),
            ..Default::default()
        });
        let contexts = derive_contexts(&reference_outline(), &settings).unwrap();
        let ordered: Vec<(&str, u32)> = contexts
            .iter()
            .map(|c| (c.title.as_str(), c.ordering))
            .collect();
        assert_eq!(
            ordered,
            vec![
                ("General", 0),
                ("Test Topic", 1),
                ("Unit", 100),
                ("Discussable Unit", 100),
                ("Graded Unit", 100),
                ("Discussable Graded Unit", 100),
            ]
        );
    }

    #[test]
    fn test_empty_topics_still_traverses_outline() {
        let settings = settings_with(DiscussionSettingsUpdate {
            topics: Some(vec![]),
            ..Default::default()
        });
        let contexts = derive_contexts(&reference_outline(), &settings).unwrap();
        assert_eq!(titles(&contexts), set(&["Unit", "Discussable Unit"]));
        assert!(contexts.iter().all(|c| c.ordering == UNIT_CONTEXT_ORDERING));
    }

    #[test]
    fn test_hundredth_topic_shares_unit_ordering() {
        let topics = (0..101)
            .map(|i| DiscussionTopic::new(format!("Topic {}", i), format!("topic-{}", i)))
            .collect();
        let settings = settings_with(DiscussionSettingsUpdate {
            topics: Some(topics),
            ..Default::default()
        });
        let contexts = derive_contexts(&reference_outline(), &settings).unwrap();
        assert_eq!(contexts.len(), 103);
        assert_eq!(contexts[99].ordering, 99);
        assert_eq!(contexts[100].ordering, UNIT_CONTEXT_ORDERING);
        assert_eq!(contexts[101].ordering, UNIT_CONTEXT_ORDERING);
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let settings = settings_with(DiscussionSettingsUpdate {
            enable_graded_units: Some(true),
            ..Default::default()
        });
        let outline = reference_outline();
        let first = derive_contexts(&outline, &settings).unwrap();
        let second = derive_contexts(&outline, &settings).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_topic_id_fails_whole_derivation() {
        let settings = settings_with(DiscussionSettingsUpdate {
            topics: Some(vec![
                DiscussionTopic::new("General", "course"),
                DiscussionTopic {
                    title: "Broken".to_string(),
                    id: None,
                },
            ]),
            ..Default::default()
        });
        assert_eq!(
            derive_contexts(&reference_outline(), &settings),
            Err(DiscussionsError::MissingTopicId {
                title: "Broken".to_string()
            })
        );
    }

    #[test]
    fn test_refresh_requires_outline() {
        assert_eq!(
            update_discussions_settings_from_course("course-v1:edX+NoOutline+2024", 1),
            Err(DiscussionsError::OutlineNotFound("course-v1:edX+NoOutline+2024".to_string()))
        );
    }

    #[test]
    fn test_refresh_stores_configuration_and_tracks_changes() {
        set_course_outline(reference_outline()).unwrap();

        let first = update_discussions_settings_from_course(COURSE, 10).unwrap();
        assert_eq!(first.course_key, COURSE);
        assert!(first.changed);
        assert_eq!(first.derived_at, 10);
        assert_eq!(first.contexts.len(), 3);

        let second = update_discussions_settings_from_course(COURSE, 20).unwrap();
        assert!(!second.changed);
        assert_eq!(second.contexts_fingerprint, first.contexts_fingerprint);

        update_course_discussion_settings(
            COURSE,
            DiscussionSettingsUpdate {
                enable_graded_units: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
        let third = update_discussions_settings_from_course(COURSE, 30).unwrap();
        assert!(third.changed);
        assert!(third.enable_graded_units);
        assert_eq!(third.contexts.len(), 5);

        assert_eq!(get_discussions_configuration(COURSE), Some(third));
    }

    #[test]
    fn test_provider_switch_counts_as_change() {
        set_course_outline(CourseOutline {
            course_key: PROVIDER_COURSE.to_string(),
            sections: vec![],
        })
        .unwrap();

        let first = update_discussions_settings_from_course(PROVIDER_COURSE, 10).unwrap();
        assert_eq!(first.provider_type, DEFAULT_PROVIDER_TYPE);
        assert!(first.changed);

        update_course_discussion_settings(
            PROVIDER_COURSE,
            DiscussionSettingsUpdate {
                provider_type: Some("piazza".to_string()),
                plugin_configuration: Some(vec![("key".to_string(), "v".to_string())]),
                ..Default::default()
            },
        )
        .unwrap();

        let second = update_discussions_settings_from_course(PROVIDER_COURSE, 20).unwrap();
        assert_eq!(second.provider_type, "piazza");
        assert_eq!(second.contexts_fingerprint, first.contexts_fingerprint);
        assert!(second.changed);

        let third = update_discussions_settings_from_course(PROVIDER_COURSE, 30).unwrap();
        assert!(!third.changed);
    }

    #[test]
    fn test_settings_update_merges_partially() {
        let merged = update_course_discussion_settings(
            SETTINGS_COURSE,
            DiscussionSettingsUpdate {
                unit_level_visibility: Some(false),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(!merged.unit_level_visibility);
        assert!(merged.enable_in_context);

        let merged = update_course_discussion_settings(
            SETTINGS_COURSE,
            DiscussionSettingsUpdate {
                provider_type: Some("piazza".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(!merged.unit_level_visibility);
        assert_eq!(merged.provider_type, "piazza");
        assert_eq!(get_course_discussion_settings(SETTINGS_COURSE), merged);
    }

    #[test]
    fn test_settings_update_rejects_bad_topics() {
        let result = update_course_discussion_settings(
            BAD_TOPICS_COURSE,
            DiscussionSettingsUpdate {
                topics: Some(vec![DiscussionTopic {
                    title: "General".to_string(),
                    id: None,
                }]),
                ..Default::default()
            },
        );
        assert!(result.is_err());
        assert_eq!(get_course_discussion_settings(BAD_TOPICS_COURSE), DiscussionSettings::default());
    }
}
