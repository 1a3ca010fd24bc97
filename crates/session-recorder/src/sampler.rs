// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Ratio-based sampling on trace ids, compatible with the standard trace-id ratio semantics.
//!
//! Debug-session trace ids are never dropped: any id that starts with a session tag is always
//! recorded and sampled, whatever the configured probability.

use crate::error::RecorderError;
use crate::trace_id::TraceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingDecision {
    Drop,
    RecordAndSample,
}

impl From<bool> for SamplingDecision {
    fn from(sampled: bool) -> Self {
        if sampled {
            Self::RecordAndSample
        } else {
            Self::Drop
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceIdRatioSampler {
    probability: f64,
    id_upper_bound: i64,
}

impl TraceIdRatioSampler {
    pub fn new(probability: f64) -> Result<Self, RecorderError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(RecorderError::Range(probability));
        }

        // The limits are special-cased to avoid precision loss across the f64/i64 boundary.
        // i64::MIN as the bound for 0.0 keeps an id of i64::MIN unsampled, since its absolute
        // value wraps to itself.
        let id_upper_bound = if probability == 0.0 {
            i64::MIN
        } else if probability == 1.0 {
            i64::MAX
        } else {
            (probability * i64::MAX as f64).round() as i64
        };

        Ok(Self {
            probability,
            id_upper_bound,
        })
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn description(&self) -> String {
        format!(
            "SessionRecorderTraceIdRatioBasedSampler{{{:.6}}}",
            self.probability
        )
    }

    pub fn should_sample(&self, trace_id: &TraceId) -> SamplingDecision {
        if trace_id.has_session_prefix() {
            return SamplingDecision::RecordAndSample;
        }
        self.should_sample_ratio(trace_id)
    }

    /// The probabilistic decision alone, without the debug-session override.
    pub fn should_sample_ratio(&self, trace_id: &TraceId) -> SamplingDecision {
        // Strict `<` never samples at probability 0, at the cost of a negligible chance of
        // dropping an id of exactly i64::MAX at probability 1.
        SamplingDecision::from(trace_id.lower_i64().wrapping_abs() < self.id_upper_bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id_with_lower(lower: i64) -> TraceId {
        let mut bytes = [0u8; 16];
        bytes[8..].copy_from_slice(&lower.to_be_bytes());
        TraceId::from_bytes(bytes)
    }

    #[test]
    fn test_rejects_out_of_range_probability() {
        assert!(matches!(
            TraceIdRatioSampler::new(-0.1),
            Err(RecorderError::Range(_))
        ));
        assert!(TraceIdRatioSampler::new(1.000_001).is_err());
        assert!(TraceIdRatioSampler::new(f64::NAN).is_err());
        assert!(TraceIdRatioSampler::new(0.0).is_ok());
        assert!(TraceIdRatioSampler::new(1.0).is_ok());
    }

    #[test]
    fn test_description() {
        let sampler = TraceIdRatioSampler::new(0.0001).unwrap();
        assert_eq!(
            sampler.description(),
            "SessionRecorderTraceIdRatioBasedSampler{0.000100}"
        );
    }

    #[test]
    fn test_extreme_ids() {
        let never = TraceIdRatioSampler::new(0.0).unwrap();
        let always = TraceIdRatioSampler::new(1.0).unwrap();
        for lower in [i64::MIN, i64::MIN + 1, -1, 0, 1, i64::MAX - 1] {
            assert_eq!(
                never.should_sample(&id_with_lower(lower)),
                SamplingDecision::Drop
            );
            assert_eq!(
                always.should_sample(&id_with_lower(lower)),
                SamplingDecision::RecordAndSample
            );
        }
    }

    #[test]
    fn test_half_ratio_threshold() {
        let half = TraceIdRatioSampler::new(0.5).unwrap();
        assert_eq!(
            half.should_sample(&id_with_lower(1)),
            SamplingDecision::RecordAndSample
        );
        assert_eq!(
            half.should_sample(&id_with_lower(-1)),
            SamplingDecision::RecordAndSample
        );
        assert_eq!(
            half.should_sample(&id_with_lower(i64::MAX - 1)),
            SamplingDecision::Drop
        );
    }

    #[test]
    fn test_debug_prefixes_always_sampled() {
        let never = TraceIdRatioSampler::new(0.0).unwrap();
        for hex in [
            "6465626465626162313263643334ffff",
            "636462636462784b3962324c6d710000",
            "6465626465627fffffffffffffffffff",
        ] {
            let id: TraceId = hex.parse().unwrap();
            assert_eq!(never.should_sample(&id), SamplingDecision::RecordAndSample);
            assert_eq!(never.should_sample_ratio(&id), SamplingDecision::Drop);
        }
    }

    proptest! {
        #[test]
        fn prop_zero_probability_never_samples(bytes in any::<[u8; 16]>()) {
            let id = TraceId::from_bytes(bytes);
            prop_assume!(!id.has_session_prefix());
            let sampler = TraceIdRatioSampler::new(0.0).unwrap();
            prop_assert_eq!(sampler.should_sample(&id), SamplingDecision::Drop);
        }

        #[test]
        fn prop_full_probability_always_samples(bytes in any::<[u8; 16]>()) {
            let sampler = TraceIdRatioSampler::new(1.0).unwrap();
            let id = TraceId::from_bytes(bytes);
            prop_assume!(id.lower_i64() != i64::MAX);
            prop_assert_eq!(sampler.should_sample(&id), SamplingDecision::RecordAndSample);
        }

        #[test]
        fn prop_session_prefixed_ids_always_sampled(
            bytes in any::<[u8; 16]>(),
            probability in 0.0f64..=1.0,
            continuous in any::<bool>(),
        ) {
            let tag: &[u8] = if continuous { b"cdbcdb" } else { b"debdeb" };
            let mut bytes = bytes;
            bytes[..tag.len()].copy_from_slice(tag);
            let sampler = TraceIdRatioSampler::new(probability).unwrap();
            prop_assert_eq!(
                sampler.should_sample(&TraceId::from_bytes(bytes)),
                SamplingDecision::RecordAndSample
            );
        }
    }
}
