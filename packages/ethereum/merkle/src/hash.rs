//! `hash_tree_root` of beacon API JSON values.
//!
//! Encoding accepted per type:
//! - `uint64`: decimal string (as served by the beacon API) or JSON number
//! - `uint256`: decimal or `0x` hex string, or JSON number
//! - byte vectors, byte lists and bitfields: `0x` hex of the SSZ encoding

use alloy_primitives::{hex, B256, U256};
use ethereum_utils::hex::{parse_quantity, parse_u256_quantity};
use serde_json::Value;
use tree_hash::{merkle_root, mix_in_length};

use crate::{
    error::MerkleError,
    schema::{Container, SszType, BYTES_PER_CHUNK},
};

const BITS_PER_CHUNK: usize = BYTES_PER_CHUNK * 8;

/// Computes the SSZ `hash_tree_root` of `value` as a `ty`.
///
/// # Errors
/// Returns [`MerkleError::Decode`] if `value` does not match `ty`.
pub fn hash_tree_root(ty: &SszType, value: &Value) -> Result<B256, MerkleError> {
    root(ty, value, "")
}

/// The roots of every field of `container`, in field order.
///
/// # Errors
/// Returns [`MerkleError::Decode`] if `value` does not match `container`.
pub fn field_roots(container: &Container, value: &Value) -> Result<Vec<B256>, MerkleError> {
    container_field_roots(container, value, "")
}

pub(crate) fn child_path(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{path}.{field}")
    }
}

fn root(ty: &SszType, value: &Value, path: &str) -> Result<B256, MerkleError> {
    match ty {
        SszType::Uint64 | SszType::Uint256 => Ok(merkle_root(&basic_bytes(ty, value, path)?, 1)),
        SszType::ByteVector(len) => {
            let bytes = decode_hex(value, path)?;
            if bytes.len() != *len {
                return Err(MerkleError::decode(
                    path,
                    format!("expected {len} bytes, found {}", bytes.len()),
                ));
            }
            Ok(merkle_root(&bytes, len.div_ceil(BYTES_PER_CHUNK)))
        }
        SszType::ByteList(max) => {
            let bytes = decode_hex(value, path)?;
            ensure_within_limit(bytes.len(), *max, path)?;
            Ok(mix_in_length(
                &merkle_root(&bytes, max.div_ceil(BYTES_PER_CHUNK)),
                bytes.len(),
            ))
        }
        SszType::Bitvector(len) => {
            let bytes = decode_hex(value, path)?;
            if bytes.len() != len.div_ceil(8) {
                return Err(MerkleError::decode(
                    path,
                    format!("expected {} bytes for {len} bits, found {}", len.div_ceil(8), bytes.len()),
                ));
            }
            Ok(merkle_root(&bytes, len.div_ceil(BITS_PER_CHUNK)))
        }
        SszType::Bitlist(max) => {
            let (bits, bit_len) = decode_bitlist(value, path)?;
            ensure_within_limit(bit_len, *max, path)?;
            Ok(mix_in_length(
                &merkle_root(&bits, max.div_ceil(BITS_PER_CHUNK)),
                bit_len,
            ))
        }
        SszType::Vector(elem, len) => {
            let items = as_array(value, path)?;
            if items.len() != *len {
                return Err(MerkleError::decode(
                    path,
                    format!("expected {len} elements, found {}", items.len()),
                ));
            }
            sequence_root(elem, items, *len, path)
        }
        SszType::List(elem, max) => {
            let items = as_array(value, path)?;
            ensure_within_limit(items.len(), *max, path)?;
            Ok(mix_in_length(
                &sequence_root(elem, items, *max, path)?,
                items.len(),
            ))
        }
        SszType::Container(container) => {
            let roots = container_field_roots(container, value, path)?;
            Ok(merkle_root(&concat(&roots), roots.len()))
        }
    }
}

/// Root of the elements of a vector or list, without the length mix in.
fn sequence_root(
    elem: &SszType,
    items: &[Value],
    limit: usize,
    path: &str,
) -> Result<B256, MerkleError> {
    if let Some(size) = elem.basic_size() {
        let mut packed = Vec::with_capacity(items.len() * size);
        for (i, item) in items.iter().enumerate() {
            packed.extend(basic_bytes(elem, item, &format!("{path}[{i}]"))?);
        }
        Ok(merkle_root(&packed, (limit * size).div_ceil(BYTES_PER_CHUNK)))
    } else {
        let roots = items
            .iter()
            .enumerate()
            .map(|(i, item)| root(elem, item, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(merkle_root(&concat(&roots), limit))
    }
}

pub(crate) fn container_field_roots(
    container: &Container,
    value: &Value,
    path: &str,
) -> Result<Vec<B256>, MerkleError> {
    container_field_roots_with(container, value, path, &[])
}

/// Same as [`container_field_roots`], taking the roots of the fields named in `known` as given.
pub(crate) fn container_field_roots_with(
    container: &Container,
    value: &Value,
    path: &str,
    known: &[(&str, B256)],
) -> Result<Vec<B256>, MerkleError> {
    let object = value.as_object().ok_or_else(|| {
        MerkleError::decode(path, format!("expected a {} object", container.name))
    })?;

    container
        .fields
        .iter()
        .map(|(name, ty)| {
            if let Some((_, root)) = known.iter().find(|(known, _)| known == name) {
                return Ok(*root);
            }
            let field_path = child_path(path, name);
            let field = object
                .get(*name)
                .ok_or_else(|| MerkleError::decode(&field_path, "missing field"))?;
            root(ty, field, &field_path)
        })
        .collect()
}

/// Little endian serialization of a basic value.
fn basic_bytes(ty: &SszType, value: &Value, path: &str) -> Result<Vec<u8>, MerkleError> {
    let invalid = || MerkleError::decode(path, format!("expected an integer, found {value}"));
    match ty {
        SszType::Uint64 => {
            let n = match value {
                Value::String(s) => parse_quantity(s).map_err(|_| invalid())?,
                Value::Number(n) => n.as_u64().ok_or_else(invalid)?,
                _ => return Err(invalid()),
            };
            Ok(n.to_le_bytes().to_vec())
        }
        SszType::Uint256 => {
            let n = match value {
                Value::String(s) => parse_u256_quantity(s).map_err(|_| invalid())?,
                Value::Number(n) => U256::from(n.as_u64().ok_or_else(invalid)?),
                _ => return Err(invalid()),
            };
            Ok(n.to_le_bytes::<32>().to_vec())
        }
        _ => Err(MerkleError::Schema(format!("{ty:?} is not a basic type"))),
    }
}

fn decode_hex(value: &Value, path: &str) -> Result<Vec<u8>, MerkleError> {
    let s = value
        .as_str()
        .ok_or_else(|| MerkleError::decode(path, format!("expected a hex string, found {value}")))?;
    hex::decode(s).map_err(|e| MerkleError::decode(path, e))
}

/// Strips the delimiter bit of an SSZ bitlist, returning the packed bits and the bit length.
fn decode_bitlist(value: &Value, path: &str) -> Result<(Vec<u8>, usize), MerkleError> {
    let mut bytes = decode_hex(value, path)?;
    let Some(last) = bytes.last_mut().filter(|last| **last != 0) else {
        return Err(MerkleError::decode(path, "bitlist without delimiter bit"));
    };
    let delimiter = last.ilog2() as usize;
    *last ^= 1 << delimiter;
    let bit_len = (bytes.len() - 1) * 8 + delimiter;
    Ok((bytes, bit_len))
}

fn as_array<'a>(value: &'a Value, path: &str) -> Result<&'a [Value], MerkleError> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| MerkleError::decode(path, format!("expected an array, found {value}")))
}

fn ensure_within_limit(len: usize, max: usize, path: &str) -> Result<(), MerkleError> {
    if len > max {
        return Err(MerkleError::decode(
            path,
            format!("length {len} exceeds limit {max}"),
        ));
    }
    Ok(())
}

pub(crate) fn concat(roots: &[B256]) -> Vec<u8> {
    roots.iter().flat_map(|root| root.0).collect()
}

#[cfg(test)]
mod test {
    use alloy_primitives::b256;
    use ethereum_types::consensus::light_client_header::BeaconBlockHeader;
    use serde_json::json;
    use sha2::{Digest, Sha256};
    use tree_hash::TreeHash;

    use super::*;
    use crate::forks::beacon_block_header;

    fn sha256(left: B256, right: B256) -> B256 {
        B256::from_slice(&Sha256::new().chain_update(left).chain_update(right).finalize())
    }

    #[test]
    fn test_container_matches_tree_hash_derive() {
        let header = BeaconBlockHeader {
            slot: 10000,
            proposer_index: 42,
            parent_root: B256::repeat_byte(1),
            state_root: B256::repeat_byte(2),
            body_root: b256!("0x045a26b541713c820616774b2082317cdd74dcff424c255c803e558843e55371"),
        };
        let json = serde_json::to_value(&header).unwrap();
        let root = hash_tree_root(&beacon_block_header().into(), &json).unwrap();
        assert_eq!(header.tree_hash_root(), root);

        // numbers are accepted as well as decimal strings
        let mut json = json;
        json["slot"] = json!(10000);
        assert_eq!(root, hash_tree_root(&beacon_block_header().into(), &json).unwrap());
    }

    #[test]
    fn test_uint64_leaf() {
        let root = hash_tree_root(&SszType::Uint64, &json!("1")).unwrap();
        let mut expected = [0u8; 32];
        expected[0] = 1;
        assert_eq!(B256::from(expected), root);
    }

    #[test]
    fn test_byte_list() {
        // ByteList[32] of two bytes: one chunk, mixed in with the length
        let root = hash_tree_root(&SszType::ByteList(32), &json!("0xabcd")).unwrap();
        let mut chunk = [0u8; 32];
        chunk[..2].copy_from_slice(&[0xab, 0xcd]);
        let mut length = [0u8; 32];
        length[0] = 2;
        assert_eq!(sha256(chunk.into(), length.into()), root);

        assert!(hash_tree_root(&SszType::ByteList(1), &json!("0xabcd"))
            .unwrap_err()
            .is_decode());
    }

    #[test]
    fn test_bitlist() {
        // a single set bit and the delimiter: 0b0000_0011
        let root = hash_tree_root(&SszType::Bitlist(8), &json!("0x03")).unwrap();
        let mut chunk = [0u8; 32];
        chunk[0] = 1;
        let mut length = [0u8; 32];
        length[0] = 1;
        assert_eq!(sha256(chunk.into(), length.into()), root);

        // empty bitlist
        let root = hash_tree_root(&SszType::Bitlist(8), &json!("0x01")).unwrap();
        assert_eq!(sha256(B256::ZERO, B256::ZERO), root);

        assert!(hash_tree_root(&SszType::Bitlist(8), &json!("0x00")).is_err());
        assert!(hash_tree_root(&SszType::Bitlist(4), &json!("0x0001")).is_err());
    }

    #[test]
    fn test_packed_list() {
        // List[uint64, 8] of [1, 2]: both values pack into a chunk, two chunks total
        let ty = SszType::List(Box::new(SszType::Uint64), 8);
        let root = hash_tree_root(&ty, &json!(["1", "2"])).unwrap();
        let mut chunk = [0u8; 32];
        chunk[0] = 1;
        chunk[8] = 2;
        let mut length = [0u8; 32];
        length[0] = 2;
        assert_eq!(
            sha256(sha256(chunk.into(), B256::ZERO), length.into()),
            root
        );
    }

    #[test]
    fn test_decode_errors_name_the_path() {
        let ty: SszType = beacon_block_header().into();
        let mut json = serde_json::to_value(BeaconBlockHeader::default()).unwrap();
        json["parent_root"] = json!("0x1234");
        let err = hash_tree_root(&ty, &json).unwrap_err();
        assert!(matches!(err, MerkleError::Decode { ref path, .. } if path == "parent_root"));

        json.as_object_mut().unwrap().remove("parent_root");
        let err = hash_tree_root(&ty, &json).unwrap_err();
        assert!(matches!(err, MerkleError::Decode { ref path, .. } if path == "parent_root"));

        let err = hash_tree_root(&ty, &json!([])).unwrap_err();
        assert!(err.is_decode());
    }
}
