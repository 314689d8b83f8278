//! Head/tail sampling of document units.
//!
//! A document is a sequence of units (pages for PDF, paragraphs for DOCX).
//! Documents at or below the threshold are read in full; larger documents
//! contribute only their first and last `sample_size` units, with an
//! omission marker standing in for the middle.

use super::ExtractionError;

/// Separator placed between non-empty text parts.
pub const PART_SEPARATOR: &str = "\n\n";

/// When and how much of a document to sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPolicy {
    /// Documents with more units than this are sampled.
    pub threshold: usize,
    /// Units kept from each end of a sampled document.
    pub sample_size: usize,
    /// Text inserted where units were skipped.
    pub marker: &'static str,
}

impl SamplingPolicy {
    pub fn new(threshold: usize, sample_size: usize, marker: &'static str) -> Self {
        Self {
            threshold,
            sample_size,
            marker,
        }
    }

    /// Unit indices to read, split into head and tail.
    ///
    /// The tail is `None` when the document is read in full.
    pub fn plan(&self, unit_count: usize) -> (std::ops::Range<usize>, Option<std::ops::Range<usize>>) {
        if unit_count <= self.threshold {
            return (0..unit_count, None);
        }
        let head_end = self.sample_size.min(unit_count);
        // Never let the tail overlap the head, even for odd configurations.
        let tail_start = unit_count.saturating_sub(self.sample_size).max(head_end);
        (0..head_end, Some(tail_start..unit_count))
    }
}

/// An open document whose units can be read one at a time.
///
/// Implementations own whatever resource backs the document; dropping the
/// handle releases it.
pub trait DocumentHandle {
    /// Total number of units in the document.
    fn unit_count(&self) -> usize;

    /// Text parts that precede the first unit (e.g. a table at the very top
    /// of a DOCX body). Always kept.
    fn leading_parts(&mut self) -> Result<Vec<String>, ExtractionError> {
        Ok(Vec::new())
    }

    /// Text parts belonging to unit `index`, in document order.
    fn unit_parts(&mut self, index: usize) -> Result<Vec<String>, ExtractionError>;
}

/// Read a document according to `policy` and join its non-empty parts.
pub fn sample_units<H: DocumentHandle + ?Sized>(
    handle: &mut H,
    policy: &SamplingPolicy,
) -> Result<String, ExtractionError> {
    let unit_count = handle.unit_count();
    let (head, tail) = policy.plan(unit_count);

    if tail.is_some() {
        tracing::debug!(
            "Sampling {} of {} units (threshold {})",
            policy.sample_size * 2,
            unit_count,
            policy.threshold
        );
    }

    let mut parts: Vec<String> = Vec::new();
    push_parts(&mut parts, handle.leading_parts()?);

    for index in head {
        push_parts(&mut parts, handle.unit_parts(index)?);
    }

    if let Some(tail) = tail {
        parts.push(policy.marker.to_string());
        for index in tail {
            push_parts(&mut parts, handle.unit_parts(index)?);
        }
    }

    Ok(parts.join(PART_SEPARATOR))
}

fn push_parts(parts: &mut Vec<String>, new_parts: Vec<String>) {
    parts.extend(
        new_parts
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "... (omitted) ...";

    /// Units named "U1".."Un"; records which indices were read.
    struct FakeDocument {
        units: Vec<String>,
        read: Vec<usize>,
    }

    impl FakeDocument {
        fn numbered(count: usize) -> Self {
            Self {
                units: (1..=count).map(|i| format!("U{}", i)).collect(),
                read: Vec::new(),
            }
        }
    }

    impl DocumentHandle for FakeDocument {
        fn unit_count(&self) -> usize {
            self.units.len()
        }

        fn unit_parts(&mut self, index: usize) -> Result<Vec<String>, ExtractionError> {
            self.read.push(index);
            Ok(vec![self.units[index].clone()])
        }
    }

    #[test]
    fn test_small_document_read_in_full() {
        let mut doc = FakeDocument::numbered(3);
        let text = sample_units(&mut doc, &SamplingPolicy::new(10, 5, MARKER)).unwrap();
        assert_eq!(text, "U1\n\nU2\n\nU3");
        assert_eq!(doc.read, vec![0, 1, 2]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut doc = FakeDocument::numbered(10);
        let text = sample_units(&mut doc, &SamplingPolicy::new(10, 5, MARKER)).unwrap();
        assert!(!text.contains(MARKER));
        assert_eq!(doc.read.len(), 10);
    }

    #[test]
    fn test_large_document_is_sampled() {
        let mut doc = FakeDocument::numbered(15);
        let text = sample_units(&mut doc, &SamplingPolicy::new(10, 5, MARKER)).unwrap();

        let expected = [
            "U1", "U2", "U3", "U4", "U5", MARKER, "U11", "U12", "U13", "U14", "U15",
        ]
        .join(PART_SEPARATOR);
        assert_eq!(text, expected);
        assert_eq!(doc.read, vec![0, 1, 2, 3, 4, 10, 11, 12, 13, 14]);
        assert!(!text.contains("U6"));
        assert!(!text.contains("U10\n"));
    }

    #[test]
    fn test_large_paragraph_document_reads_only_sampled_units() {
        let mut doc = FakeDocument::numbered(400);
        let text = sample_units(&mut doc, &SamplingPolicy::new(180, 90, MARKER)).unwrap();

        assert_eq!(doc.read.len(), 180);
        assert_eq!(text.matches(MARKER).count(), 1);
        assert!(text.starts_with("U1\n\n"));
        assert!(text.contains("U90\n\n"));
        assert!(!text.contains("U91\n\n"));
        assert!(text.contains("U311"));
        assert!(!text.contains("U310\n\n"));
        assert!(text.ends_with("U400"));
    }

    #[test]
    fn test_empty_units_are_dropped() {
        let mut doc = FakeDocument {
            units: vec!["a".into(), "   ".into(), "".into(), " b \n".into()],
            read: Vec::new(),
        };
        let text = sample_units(&mut doc, &SamplingPolicy::new(10, 5, MARKER)).unwrap();
        assert_eq!(text, "a\n\nb");
    }

    #[test]
    fn test_zero_units() {
        let mut doc = FakeDocument::numbered(0);
        let text = sample_units(&mut doc, &SamplingPolicy::new(10, 5, MARKER)).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn test_plan_never_overlaps() {
        let policy = SamplingPolicy::new(3, 5, MARKER);
        let (head, tail) = policy.plan(7);
        assert_eq!(head, 0..5);
        assert_eq!(tail, Some(5..7));
    }

    #[test]
    fn test_unit_error_propagates() {
        struct Broken;
        impl DocumentHandle for Broken {
            fn unit_count(&self) -> usize {
                2
            }
            fn unit_parts(&mut self, _index: usize) -> Result<Vec<String>, ExtractionError> {
                Err(ExtractionError::CorruptDocument("bad page".into()))
            }
        }

        let err = sample_units(&mut Broken, &SamplingPolicy::new(10, 5, MARKER)).unwrap_err();
        assert!(matches!(err, ExtractionError::CorruptDocument(_)));
    }
}
