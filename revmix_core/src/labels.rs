use serde::{Deserialize, Serialize};

use crate::RevMixError;

/// One annotated sound event, in frames. `offset` is exclusive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub label: String,
    pub onset: usize,
    pub offset: usize,
}

impl Event {
    pub fn new<S: Into<String>>(label: S, onset: usize, offset: usize) -> Self {
        Self {
            label: label.into(),
            onset,
            offset,
        }
    }
}

/// Encodes event labels into multi-hot rows and decodes them back.
///
/// A weak (clip-level) annotation becomes a single row with a 1 for every
/// active class. A strong (frame-level) annotation becomes a frames x labels
/// grid; decoding a grid recovers the contiguous active regions per class.
/// Multiple classes may be active at once.
///
/// The encoder derives `Serialize`/`Deserialize` so its vocabulary and frame
/// count can be persisted next to a model checkpoint and restored later.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiHotEncoder {
    labels: Vec<String>,
    n_frames: Option<usize>,
}

impl MultiHotEncoder {
    /// Encoder for weak annotations over the given class vocabulary.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            n_frames: None,
        }
    }

    /// Encoder for strong annotations over segments of `n_frames` frames.
    pub fn with_frames<I, S>(labels: I, n_frames: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            n_frames: Some(n_frames),
            ..Self::new(labels)
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn n_frames(&self) -> Option<usize> {
        self.n_frames
    }

    fn index_of(&self, label: &str) -> Result<usize, RevMixError> {
        self.labels
            .iter()
            .position(|known| known == label)
            .ok_or_else(|| RevMixError::UnknownLabel(label.to_owned()))
    }

    /// Encode a clip-level annotation into one multi-hot row.
    pub fn encode_weak<'a, I>(&self, active: I) -> Result<Vec<u8>, RevMixError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut row = vec![0u8; self.labels.len()];
        for label in active {
            row[self.index_of(label)?] = 1;
        }
        Ok(row)
    }

    /// Encode frame-level events into a frames x labels grid.
    ///
    /// Requires a frame count; event spans reaching past the end of the
    /// segment are clamped to it.
    pub fn encode_strong(&self, events: &[Event]) -> Result<Vec<Vec<u8>>, RevMixError> {
        let n_frames = self.n_frames.ok_or(RevMixError::FrameCountMissing)?;
        let mut grid = vec![vec![0u8; self.labels.len()]; n_frames];
        for event in events {
            let index = self.index_of(&event.label)?;
            let offset = event.offset.min(n_frames);
            for row in grid.iter_mut().take(offset).skip(event.onset.min(offset)) {
                row[index] = 1;
            }
        }
        Ok(grid)
    }

    /// Names of the classes active in one multi-hot row.
    pub fn decode_weak(&self, row: &[u8]) -> Vec<&str> {
        self.labels
            .iter()
            .zip(row)
            .filter(|(_, &value)| value != 0)
            .map(|(label, _)| label.as_str())
            .collect()
    }

    /// Recover frame-level events from a grid produced by [`encode_strong`].
    ///
    /// Events are returned class by class, each class's regions in onset
    /// order.
    pub fn decode_strong(&self, grid: &[Vec<u8>]) -> Vec<Event> {
        let mut events = Vec::new();
        for (index, label) in self.labels.iter().enumerate() {
            let activity: Vec<bool> = grid
                .iter()
                .map(|row| row.get(index).copied().unwrap_or(0) != 0)
                .collect();
            for (onset, offset) in contiguous_regions(&activity) {
                events.push(Event::new(label.clone(), onset, offset));
            }
        }
        events
    }
}

/// Contiguous `true` runs of an activity track as `(onset, offset)` pairs,
/// offsets exclusive.
pub fn contiguous_regions(activity: &[bool]) -> Vec<(usize, usize)> {
    let mut regions = Vec::new();
    let mut onset = None;
    for (frame, &active) in activity.iter().enumerate() {
        match (onset, active) {
            (None, true) => onset = Some(frame),
            (Some(start), false) => {
                regions.push((start, frame));
                onset = None;
            }
            _ => {}
        }
    }
    if let Some(start) = onset {
        regions.push((start, activity.len()));
    }
    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> MultiHotEncoder {
        MultiHotEncoder::new(["Speech", "Dog", "Blender"])
    }

    #[test]
    fn weak_encoding_marks_active_classes() {
        let row = encoder().encode_weak(["Blender", "Speech"]).unwrap();
        assert_eq!(row, vec![1, 0, 1]);
    }

    #[test]
    fn weak_encoding_of_nothing_is_all_zero() {
        let row = encoder().encode_weak([]).unwrap();
        assert_eq!(row, vec![0, 0, 0]);
    }

    #[test]
    fn weak_encoding_rejects_unknown_labels() {
        let err = encoder().encode_weak(["Cat"]).unwrap_err();
        assert!(matches!(err, RevMixError::UnknownLabel(label) if label == "Cat"));
    }

    #[test]
    fn weak_decoding_recovers_names() {
        let encoder = encoder();
        let row = encoder.encode_weak(["Dog"]).unwrap();
        assert_eq!(encoder.decode_weak(&row), vec!["Dog"]);
    }

    #[test]
    fn strong_encoding_fills_event_spans() {
        let encoder = MultiHotEncoder::with_frames(["Speech", "Dog"], 5);
        let grid = encoder
            .encode_strong(&[Event::new("Dog", 1, 3), Event::new("Speech", 4, 5)])
            .unwrap();
        assert_eq!(
            grid,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 1],
                vec![0, 0],
                vec![1, 0],
            ]
        );
    }

    #[test]
    fn strong_encoding_clamps_spans_to_segment() {
        let encoder = MultiHotEncoder::with_frames(["Speech"], 3);
        let grid = encoder.encode_strong(&[Event::new("Speech", 2, 10)]).unwrap();
        assert_eq!(grid, vec![vec![0], vec![0], vec![1]]);
    }

    #[test]
    fn strong_encoding_requires_frame_count() {
        let err = encoder().encode_strong(&[]).unwrap_err();
        assert!(matches!(err, RevMixError::FrameCountMissing));
    }

    #[test]
    fn strong_round_trip_recovers_events() {
        let encoder = MultiHotEncoder::with_frames(["Speech", "Dog"], 8);
        let events = vec![
            Event::new("Speech", 0, 2),
            Event::new("Speech", 5, 8),
            Event::new("Dog", 3, 6),
        ];
        let grid = encoder.encode_strong(&events).unwrap();
        assert_eq!(encoder.decode_strong(&grid), events);
    }

    #[test]
    fn contiguous_regions_handles_edges() {
        assert_eq!(contiguous_regions(&[]), vec![]);
        assert_eq!(contiguous_regions(&[false, false]), vec![]);
        assert_eq!(contiguous_regions(&[true, true]), vec![(0, 2)]);
        assert_eq!(
            contiguous_regions(&[true, false, true, true, false]),
            vec![(0, 1), (2, 4)]
        );
    }

    #[test]
    fn encoder_state_round_trips_through_serde() {
        let encoder = MultiHotEncoder::with_frames(["Speech", "Dog"], 625);
        let json = serde_json::to_string(&encoder).unwrap();
        let restored: MultiHotEncoder = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, encoder);
    }
}
