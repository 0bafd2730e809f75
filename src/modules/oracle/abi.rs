//! Byte-exact transmit payload codec.
//!
//! The wire format is fixed by the external verifier:
//!
//! * outer tuple: `(bytes report, bytes32[] rs, bytes32[] ss, bytes32 rawVs)`
//! * inner report: `(bytes32 domainSeparationTag, bytes32 observers, int192[] observations)`
//!
//! Byte *i* of `observers` is the identifier of the oracle that produced the
//! *i*-th observation; unused slots are zero. Byte *i* of `rawVs` is the
//! recovery id of the *i*-th signature.
use ethabi::{ParamType, Token};
use thiserror::Error;

use crate::crypto::signature::Signature;

use super::report::{
    AttestedReportMany, AttributedObservation, Observation, ObserverId, OffchainReport,
    ReportContext,
};

/// Width of the observer vector, which also bounds the signature count since
/// `rawVs` has one byte slot per signature.
pub const MAX_ORACLES: usize = 32;

/// Errors emitted while packing a report.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("too many observations: {0}, the observer vector has {MAX_ORACLES} slots")]
    TooManyObservations(usize),
    #[error("too many signatures: {0}, rawVs has {MAX_ORACLES} slots")]
    TooManySignatures(usize),
    #[error("duplicate observer identifier {0}")]
    DuplicateObserver(u8),
    #[error("observation does not fit a non-negative int192")]
    ObservationOutOfRange,
}

/// Errors emitted while unpacking a transmit payload.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed transmit payload: {0}")]
    Abi(#[from] ethabi::Error),
    #[error("unexpected token layout in transmit payload")]
    UnexpectedToken,
    #[error("{observations} observations for {observers} marked observers")]
    CountMismatch {
        observations: usize,
        observers: usize,
    },
    #[error("signature component arrays of unequal length: {rs} rs, {ss} ss")]
    SignatureComponents { rs: usize, ss: usize },
    #[error("too many signatures: {0}, rawVs has {MAX_ORACLES} slots")]
    TooManySignatures(usize),
    #[error("observation does not fit a non-negative int192")]
    ObservationOutOfRange,
}

fn observation_to_int192(observation: &Observation) -> Result<ethabi::Int, EncodeError> {
    let raw = observation.as_bytes();
    if raw.len() > 32 {
        return Err(EncodeError::ObservationOutOfRange);
    }
    let value = observation.to_u256();
    if value.bits() > 191 {
        return Err(EncodeError::ObservationOutOfRange);
    }
    Ok(value)
}

/// Encode the inner serialized report for (context, observations).
///
/// This is the canonical byte encoding oracles sign and the verifier hashes;
/// observations are ordered by ascending observer identifier regardless of
/// input order.
pub fn encode_report(
    context: &ReportContext,
    observations: &[AttributedObservation],
) -> Result<Vec<u8>, EncodeError> {
    if observations.len() > MAX_ORACLES {
        return Err(EncodeError::TooManyObservations(observations.len()));
    }

    let mut ordered: Vec<&AttributedObservation> = observations.iter().collect();
    ordered.sort_by_key(|attributed| attributed.observer);

    let mut observers = [0u8; 32];
    let mut values = Vec::with_capacity(ordered.len());
    for (i, attributed) in ordered.iter().enumerate() {
        if i > 0 && ordered[i - 1].observer == attributed.observer {
            return Err(EncodeError::DuplicateObserver(attributed.observer.get()));
        }
        observers[i] = attributed.observer.get();
        values.push(Token::Int(observation_to_int192(&attributed.observation)?));
    }

    Ok(ethabi::encode(&[
        Token::FixedBytes(context.domain_separation_tag().to_vec()),
        Token::FixedBytes(observers.to_vec()),
        Token::Array(values),
    ]))
}

/// Pack a multi-signed report into the transmit byte string.
pub fn pack(context: &ReportContext, report: &AttestedReportMany) -> Result<Vec<u8>, EncodeError> {
    if report.signatures.len() > MAX_ORACLES {
        return Err(EncodeError::TooManySignatures(report.signatures.len()));
    }
    let serialized = encode_report(context, &report.observations)?;

    let mut rs = Vec::with_capacity(report.signatures.len());
    let mut ss = Vec::with_capacity(report.signatures.len());
    let mut raw_vs = [0u8; 32];
    for (i, signature) in report.signatures.iter().enumerate() {
        rs.push(Token::FixedBytes(signature.r().to_vec()));
        ss.push(Token::FixedBytes(signature.s().to_vec()));
        raw_vs[i] = signature.v();
    }

    Ok(ethabi::encode(&[
        Token::Bytes(serialized),
        Token::Array(rs),
        Token::Array(ss),
        Token::FixedBytes(raw_vs.to_vec()),
    ]))
}

/// Unpack a transmit byte string into its report context, attributed
/// observations and signatures.
pub fn unpack(data: &[u8]) -> Result<OffchainReport, DecodeError> {
    let outer = ethabi::decode(
        &[
            ParamType::Bytes,
            ParamType::Array(Box::new(ParamType::FixedBytes(32))),
            ParamType::Array(Box::new(ParamType::FixedBytes(32))),
            ParamType::FixedBytes(32),
        ],
        data,
    )?;
    let mut outer = outer.into_iter();
    let serialized = match outer.next() {
        Some(Token::Bytes(raw)) => raw,
        _ => return Err(DecodeError::UnexpectedToken),
    };
    let rs = match outer.next() {
        Some(Token::Array(tokens)) => tokens,
        _ => return Err(DecodeError::UnexpectedToken),
    };
    let ss = match outer.next() {
        Some(Token::Array(tokens)) => tokens,
        _ => return Err(DecodeError::UnexpectedToken),
    };
    let raw_vs = match outer.next() {
        Some(Token::FixedBytes(raw)) => raw,
        _ => return Err(DecodeError::UnexpectedToken),
    };

    if rs.len() != ss.len() {
        return Err(DecodeError::SignatureComponents {
            rs: rs.len(),
            ss: ss.len(),
        });
    }
    if rs.len() > MAX_ORACLES {
        return Err(DecodeError::TooManySignatures(rs.len()));
    }

    let mut signatures = Vec::with_capacity(rs.len());
    for (i, (r, s)) in rs.into_iter().zip(ss).enumerate() {
        let (Token::FixedBytes(r), Token::FixedBytes(s)) = (r, s) else {
            return Err(DecodeError::UnexpectedToken);
        };
        let r: [u8; 32] = r.try_into().map_err(|_| DecodeError::UnexpectedToken)?;
        let s: [u8; 32] = s.try_into().map_err(|_| DecodeError::UnexpectedToken)?;
        signatures.push(Signature::from_parts(r, s, raw_vs[i]));
    }

    let inner = ethabi::decode(
        &[
            ParamType::FixedBytes(32),
            ParamType::FixedBytes(32),
            ParamType::Array(Box::new(ParamType::Int(192))),
        ],
        &serialized,
    )?;
    let mut inner = inner.into_iter();
    let raw_context = match inner.next() {
        Some(Token::FixedBytes(raw)) => raw,
        _ => return Err(DecodeError::UnexpectedToken),
    };
    let raw_observers = match inner.next() {
        Some(Token::FixedBytes(raw)) => raw,
        _ => return Err(DecodeError::UnexpectedToken),
    };
    let value_tokens = match inner.next() {
        Some(Token::Array(tokens)) => tokens,
        _ => return Err(DecodeError::UnexpectedToken),
    };

    let raw_context: [u8; 32] = raw_context
        .try_into()
        .map_err(|_| DecodeError::UnexpectedToken)?;
    let context = ReportContext::from_tag_bytes(&raw_context);

    // Non-zero observer slots, in ascending index order.
    let observers: Vec<ObserverId> = raw_observers
        .iter()
        .copied()
        .filter_map(ObserverId::new)
        .collect();
    if observers.len() != value_tokens.len() {
        return Err(DecodeError::CountMismatch {
            observations: value_tokens.len(),
            observers: observers.len(),
        });
    }

    let mut observations = Vec::with_capacity(value_tokens.len());
    for (token, observer) in value_tokens.into_iter().zip(observers) {
        let Token::Int(value) = token else {
            return Err(DecodeError::UnexpectedToken);
        };
        if value.bits() > 191 {
            return Err(DecodeError::ObservationOutOfRange);
        }
        observations.push(AttributedObservation {
            observation: Observation::from_u256(value),
            observer,
        });
    }

    Ok(OffchainReport {
        context,
        report: AttestedReportMany {
            observations,
            signatures,
        },
    })
}

#[cfg(test)]
mod test {
    use ethabi::ethereum_types::U256;

    use crate::{crypto::signature::KeyBundle, modules::oracle::report::ConfigDigest};

    use super::*;

    fn test_context() -> ReportContext {
        ReportContext {
            config_digest: ConfigDigest::new(*b"0123456789abcdef"),
            epoch: 7,
            round: 3,
        }
    }

    fn attributed(value: u64, observer: u8) -> AttributedObservation {
        AttributedObservation::new(Observation::from(value), observer).unwrap()
    }

    fn signed_report(observations: Vec<AttributedObservation>) -> AttestedReportMany {
        let context = test_context();
        let signatures = [[42u8; 32], [43u8; 32]]
            .iter()
            .map(|seed| {
                let bundle = KeyBundle::from_slice(seed).unwrap();
                bundle
                    .sign(&encode_report(&context, &observations).unwrap())
                    .unwrap()
            })
            .collect();
        AttestedReportMany {
            observations,
            signatures,
        }
    }

    #[test]
    fn test_encode_report_exact_layout() {
        let context = test_context();
        let encoded = encode_report(&context, &[attributed(100, 42)]).unwrap();

        // (bytes32, bytes32, int192[]) with one element: tag word, observer
        // word, array offset word (0x60), array length word, value word.
        let mut expected = Vec::new();
        expected.extend_from_slice(&context.domain_separation_tag());
        let mut observers = [0u8; 32];
        observers[0] = 42;
        expected.extend_from_slice(&observers);
        let mut offset = [0u8; 32];
        offset[31] = 0x60;
        expected.extend_from_slice(&offset);
        let mut length = [0u8; 32];
        length[31] = 1;
        expected.extend_from_slice(&length);
        let mut value = [0u8; 32];
        value[31] = 100;
        expected.extend_from_slice(&value);

        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_pack_unpack_roundtrip() {
        let context = test_context();
        // Descending input order; the packed form is ascending by observer.
        let report = signed_report(vec![attributed(101, 88), attributed(100, 42)]);

        let packed = pack(&context, &report).unwrap();
        let unpacked = unpack(&packed).unwrap();

        assert_eq!(unpacked.context, context);
        assert_eq!(
            unpacked.report.observations,
            vec![attributed(100, 42), attributed(101, 88)],
        );
        assert_eq!(unpacked.report.signatures, report.signatures);
    }

    #[test]
    fn test_pack_empty_signatures() {
        let context = test_context();
        let report = AttestedReportMany {
            observations: vec![attributed(1, 1)],
            signatures: vec![],
        };

        let unpacked = unpack(&pack(&context, &report).unwrap()).unwrap();
        assert!(unpacked.report.signatures.is_empty());
        assert_eq!(unpacked.report.observations, report.observations);
    }

    #[test]
    fn test_pack_rejects_too_many_observations() {
        let context = test_context();
        let observations: Vec<_> = (1u8..=33).map(|id| attributed(id as u64, id)).collect();
        assert!(matches!(
            encode_report(&context, &observations),
            Err(EncodeError::TooManyObservations(33)),
        ));
    }

    #[test]
    fn test_pack_rejects_too_many_signatures() {
        let context = test_context();
        let report = AttestedReportMany {
            observations: vec![attributed(1, 1)],
            signatures: vec![Signature::from_parts([1u8; 32], [2u8; 32], 0); 33],
        };
        assert!(matches!(
            pack(&context, &report),
            Err(EncodeError::TooManySignatures(33)),
        ));
    }

    #[test]
    fn test_pack_rejects_duplicate_observer() {
        let context = test_context();
        assert!(matches!(
            encode_report(&context, &[attributed(1, 7), attributed(2, 7)]),
            Err(EncodeError::DuplicateObserver(7)),
        ));
    }

    #[test]
    fn test_pack_rejects_oversized_observation() {
        let context = test_context();
        // 2^191 is the first value that no longer fits a non-negative int192.
        let too_large = Observation::from_u256(U256::from(1) << 191);
        let observations = vec![AttributedObservation {
            observation: too_large,
            observer: ObserverId::new(1).unwrap(),
        }];
        assert!(matches!(
            encode_report(&context, &observations),
            Err(EncodeError::ObservationOutOfRange),
        ));

        let just_fits = Observation::from_u256((U256::from(1) << 191) - 1);
        let observations = vec![AttributedObservation {
            observation: just_fits,
            observer: ObserverId::new(1).unwrap(),
        }];
        assert!(encode_report(&context, &observations).is_ok());
    }

    #[test]
    fn test_unpack_count_mismatch() {
        let context = test_context();
        // Three marked observers but only two observation values.
        let mut observers = [0u8; 32];
        observers[0] = 1;
        observers[1] = 2;
        observers[2] = 3;
        let serialized = ethabi::encode(&[
            Token::FixedBytes(context.domain_separation_tag().to_vec()),
            Token::FixedBytes(observers.to_vec()),
            Token::Array(vec![
                Token::Int(U256::from(100)),
                Token::Int(U256::from(101)),
            ]),
        ]);
        let payload = ethabi::encode(&[
            Token::Bytes(serialized),
            Token::Array(vec![]),
            Token::Array(vec![]),
            Token::FixedBytes(vec![0u8; 32]),
        ]);

        assert!(matches!(
            unpack(&payload),
            Err(DecodeError::CountMismatch {
                observations: 2,
                observers: 3,
            }),
        ));
    }

    #[test]
    fn test_unpack_rejects_negative_observation() {
        let context = test_context();
        let mut observers = [0u8; 32];
        observers[0] = 1;
        let serialized = ethabi::encode(&[
            Token::FixedBytes(context.domain_separation_tag().to_vec()),
            Token::FixedBytes(observers.to_vec()),
            // Two's complement -1, which is not a valid observation.
            Token::Array(vec![Token::Int(U256::MAX)]),
        ]);
        let payload = ethabi::encode(&[
            Token::Bytes(serialized),
            Token::Array(vec![]),
            Token::Array(vec![]),
            Token::FixedBytes(vec![0u8; 32]),
        ]);

        assert!(matches!(
            unpack(&payload),
            Err(DecodeError::ObservationOutOfRange),
        ));
    }

    #[test]
    fn test_unpack_rejects_garbage() {
        assert!(matches!(unpack(b"not abi"), Err(DecodeError::Abi(_))));
        assert!(matches!(unpack(&[]), Err(DecodeError::Abi(_))));
    }

    #[test]
    fn test_unpack_preserves_signature_bytes() {
        let context = test_context();
        let report = AttestedReportMany {
            observations: vec![attributed(5, 9)],
            signatures: vec![
                Signature::from_parts([0x11; 32], [0x22; 32], 1),
                Signature::from_parts([0x33; 32], [0x44; 32], 0),
            ],
        };

        let unpacked = unpack(&pack(&context, &report).unwrap()).unwrap();
        assert_eq!(unpacked.report.signatures, report.signatures);
    }
}
