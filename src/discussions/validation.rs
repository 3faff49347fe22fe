//! Validation logic for the Discussions module
//!
//! Every check here runs before derivation so that a malformed outline or
//! settings value is rejected as a whole instead of yielding partial contexts.

use std::collections::BTreeSet;

use super::error::DiscussionsError;
use super::types::*;

/// Validate a course key argument
pub fn validate_course_key(course_key: &str) -> Result<(), DiscussionsError> {
    if course_key.trim().is_empty() {
        return Err(DiscussionsError::EmptyCourseKey);
    }
    Ok(())
}

/// Validate course-wide topics: non-empty unique titles, each with an id
pub fn validate_topics(topics: &[DiscussionTopic]) -> Result<(), DiscussionsError> {
    let mut seen = BTreeSet::new();

    for topic in topics {
        if topic.title.trim().is_empty() {
            return Err(DiscussionsError::EmptyTopicTitle);
        }
        match topic.id.as_deref() {
            Some(id) if !id.trim().is_empty() => {}
            _ => {
                return Err(DiscussionsError::MissingTopicId {
                    title: topic.title.clone(),
                })
            }
        }
        if !seen.insert(topic.title.as_str()) {
            return Err(DiscussionsError::DuplicateTopic(topic.title.clone()));
        }
    }

    Ok(())
}

/// Validate outline structure: every block keyed, no usage key repeated
pub fn validate_outline(outline: &CourseOutline) -> Result<(), DiscussionsError> {
    validate_course_key(&outline.course_key)?;

    let mut seen = BTreeSet::new();
    for section in &outline.sections {
        record_usage_key(&mut seen, &section.usage_key, &section.display_name)?;
        for subsection in &section.subsections {
            record_usage_key(&mut seen, &subsection.usage_key, &subsection.display_name)?;
            for unit in &subsection.units {
                record_usage_key(&mut seen, &unit.usage_key, &unit.display_name)?;
            }
        }
    }

    Ok(())
}

fn record_usage_key<'a>(
    seen: &mut BTreeSet<&'a str>,
    usage_key: &'a str,
    display_name: &str,
) -> Result<(), DiscussionsError> {
    if usage_key.trim().is_empty() {
        return Err(DiscussionsError::BlankUsageKey {
            display_name: display_name.to_string(),
        });
    }
    if !seen.insert(usage_key) {
        return Err(DiscussionsError::DuplicateUsageKey(usage_key.to_string()));
    }
    Ok(())
}

/// Validate that an outline was resolved for the course being configured
pub fn validate_outline_course(
    outline: &CourseOutline,
    course_key: &str,
) -> Result<(), DiscussionsError> {
    if outline.course_key != course_key {
        return Err(DiscussionsError::CourseKeyMismatch {
            expected: course_key.to_string(),
            actual: outline.course_key.clone(),
        });
    }
    Ok(())
}
