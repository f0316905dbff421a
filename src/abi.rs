//! ABI helpers
//!
//! Hashes ABI definitions into journal keys, picks the constructor or function
//! entry a record invokes, and encodes the stored JSON arguments into call data.

use crate::error::RecorderError;
use crate::records::FunctionKind;
use alloy_dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier};
use alloy_json_abi::{Constructor, Function, JsonAbi, Param, StateMutability};
use alloy_primitives::{keccak256, Bytes, B256};
use serde_json::Value;

/// The ABI entry a record invokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallSignature {
    Constructor(Constructor),
    Function(Function),
}

impl CallSignature {
    fn inputs(&self) -> &[Param] {
        match self {
            CallSignature::Constructor(constructor) => &constructor.inputs,
            CallSignature::Function(function) => &function.inputs,
        }
    }
}

/// Content hash of an ABI: keccak256 over its JSON serialization.
pub fn abi_hash(abi: &JsonAbi) -> Result<B256, serde_json::Error> {
    let encoded = serde_json::to_vec(abi)?;
    Ok(keccak256(encoded))
}

/// Constructor entry of the ABI.
///
/// Contracts without an explicit constructor get an implicit one with no inputs.
pub fn constructor_signature_for(abi: &JsonAbi) -> Constructor {
    abi.constructor.clone().unwrap_or(Constructor {
        inputs: Vec::new(),
        state_mutability: StateMutability::NonPayable,
    })
}

/// Function named `name`.
///
/// Among overloads, the first one taking `arity` arguments wins; otherwise the
/// first declared overload is returned.
pub fn function_signature_for<'a>(
    abi: &'a JsonAbi,
    name: &str,
    arity: usize,
) -> Option<&'a Function> {
    let overloads = abi.function(name)?;
    overloads
        .iter()
        .find(|function| function.inputs.len() == arity)
        .or_else(|| overloads.first())
}

/// Select the ABI entry for a record.
pub fn signature_for(
    abi: &JsonAbi,
    kind: FunctionKind,
    name: Option<&str>,
    arity: usize,
) -> Option<CallSignature> {
    match kind {
        FunctionKind::Constructor => {
            Some(CallSignature::Constructor(constructor_signature_for(abi)))
        }
        FunctionKind::Function => function_signature_for(abi, name?, arity)
            .cloned()
            .map(CallSignature::Function),
    }
}

/// Encode call data for `signature`.
///
/// Function calls get the 4-byte selector followed by the encoded arguments.
/// Constructor calls get the deployment bytecode followed by the encoded arguments.
pub fn encode_call_data(
    signature: &CallSignature,
    parameters: &[Value],
    bytecode: Option<&Bytes>,
) -> Result<Bytes, RecorderError> {
    let inputs = signature.inputs();
    if inputs.len() != parameters.len() {
        return Err(RecorderError::Encoding(format!(
            "expected {} arguments, got {}",
            inputs.len(),
            parameters.len()
        )));
    }

    let values = inputs
        .iter()
        .zip(parameters)
        .map(|(param, value)| coerce_param(param, value))
        .collect::<Result<Vec<_>, _>>()?;

    match signature {
        CallSignature::Function(function) => function
            .abi_encode_input(&values)
            .map(Bytes::from)
            .map_err(|e| RecorderError::Encoding(e.to_string())),
        CallSignature::Constructor(constructor) => {
            let bytecode = bytecode.ok_or_else(|| {
                RecorderError::Encoding("missing deployment bytecode".to_string())
            })?;
            let args = constructor
                .abi_encode_input(&values)
                .map_err(|e| RecorderError::Encoding(e.to_string()))?;
            let mut data = bytecode.to_vec();
            data.extend_from_slice(&args);
            Ok(Bytes::from(data))
        }
    }
}

fn coerce_param(param: &Param, value: &Value) -> Result<DynSolValue, RecorderError> {
    let ty: DynSolType = param.resolve().map_err(|e| {
        RecorderError::Encoding(format!("unsupported type for `{}`: {}", param.name, e))
    })?;
    coerce_value(&ty, value).map_err(|e| {
        RecorderError::Encoding(format!(
            "invalid value {} for `{}` ({}): {}",
            value,
            param.name,
            ty.sol_type_name(),
            e
        ))
    })
}

/// Convert a stored JSON argument into a typed ABI value.
///
/// Arrays and tuples are walked element by element; scalars are parsed from
/// their string form.
fn coerce_value(ty: &DynSolType, value: &Value) -> Result<DynSolValue, alloy_dyn_abi::Error> {
    match (ty, value) {
        (DynSolType::Array(inner), Value::Array(items)) => items
            .iter()
            .map(|item| coerce_value(inner, item))
            .collect::<Result<Vec<_>, _>>()
            .map(DynSolValue::Array),
        (DynSolType::FixedArray(inner, len), Value::Array(items)) if items.len() == *len => items
            .iter()
            .map(|item| coerce_value(inner, item))
            .collect::<Result<Vec<_>, _>>()
            .map(DynSolValue::FixedArray),
        (DynSolType::Tuple(types), Value::Array(items)) if types.len() == items.len() => types
            .iter()
            .zip(items)
            .map(|(ty, item)| coerce_value(ty, item))
            .collect::<Result<Vec<_>, _>>()
            .map(DynSolValue::Tuple),
        (_, Value::String(s)) => ty.coerce_str(s),
        (_, other) => ty.coerce_str(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn storage_abi() -> JsonAbi {
        serde_json::from_value(json!([
            {
                "type": "constructor",
                "inputs": [{ "name": "initial", "type": "uint256", "internalType": "uint256" }],
                "stateMutability": "nonpayable"
            },
            {
                "type": "function",
                "name": "set",
                "inputs": [{ "name": "value", "type": "uint256", "internalType": "uint256" }],
                "outputs": [],
                "stateMutability": "nonpayable"
            },
            {
                "type": "function",
                "name": "set",
                "inputs": [
                    { "name": "value", "type": "uint256", "internalType": "uint256" },
                    { "name": "owners", "type": "address[]", "internalType": "address[]" }
                ],
                "outputs": [],
                "stateMutability": "nonpayable"
            }
        ]))
        .unwrap()
    }

    #[test]
    fn test_abi_hash_is_stable() {
        let abi = storage_abi();
        assert_eq!(abi_hash(&abi).unwrap(), abi_hash(&abi.clone()).unwrap());
        assert_ne!(abi_hash(&abi).unwrap(), abi_hash(&JsonAbi::default()).unwrap());
    }

    #[test]
    fn test_function_overload_by_arity() {
        let abi = storage_abi();
        let one = function_signature_for(&abi, "set", 1).unwrap();
        assert_eq!(one.inputs.len(), 1);
        let two = function_signature_for(&abi, "set", 2).unwrap();
        assert_eq!(two.inputs.len(), 2);
        // No overload with three inputs: first declared wins
        let fallback = function_signature_for(&abi, "set", 3).unwrap();
        assert_eq!(fallback.inputs.len(), 1);
        assert!(function_signature_for(&abi, "missing", 0).is_none());
    }

    #[test]
    fn test_implicit_constructor() {
        let ctor = constructor_signature_for(&JsonAbi::default());
        assert!(ctor.inputs.is_empty());
        assert!(signature_for(&JsonAbi::default(), FunctionKind::Function, None, 0).is_none());
    }

    #[test]
    fn test_encode_function_call() {
        let abi = storage_abi();
        let signature = signature_for(&abi, FunctionKind::Function, Some("set"), 1).unwrap();
        let data = encode_call_data(&signature, &[json!("42")], None).unwrap();

        let CallSignature::Function(function) = &signature else {
            panic!("expected a function signature");
        };
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(&data[..4], function.selector().as_slice());
        assert_eq!(data[35], 42);

        // Numbers work as well as strings
        let numeric = encode_call_data(&signature, &[json!(42)], None).unwrap();
        assert_eq!(numeric, data);
    }

    #[test]
    fn test_encode_array_argument() {
        let abi = storage_abi();
        let signature = signature_for(&abi, FunctionKind::Function, Some("set"), 2).unwrap();
        let params = [
            json!("1"),
            json!([
                "0x0000000000000000000000000000000000000001",
                "0x0000000000000000000000000000000000000002"
            ]),
        ];
        let data = encode_call_data(&signature, &params, None).unwrap();
        // selector + head (2 words) + length + 2 elements
        assert_eq!(data.len(), 4 + 32 * 5);
    }

    #[test]
    fn test_encode_constructor_appends_args_to_bytecode() {
        let abi = storage_abi();
        let signature = signature_for(&abi, FunctionKind::Constructor, None, 1).unwrap();
        let bytecode = Bytes::from(vec![0x60, 0x80, 0x60, 0x40]);
        let data = encode_call_data(&signature, &[json!("7")], Some(&bytecode)).unwrap();
        assert_eq!(&data[..4], &[0x60, 0x80, 0x60, 0x40]);
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(data[35], 7);

        let missing = encode_call_data(&signature, &[json!("7")], None);
        assert!(matches!(missing, Err(RecorderError::Encoding(_))));
    }

    #[test]
    fn test_encode_errors() {
        let abi = storage_abi();
        let signature = signature_for(&abi, FunctionKind::Function, Some("set"), 1).unwrap();
        assert!(matches!(
            encode_call_data(&signature, &[], None),
            Err(RecorderError::Encoding(_))
        ));
        assert!(matches!(
            encode_call_data(&signature, &[json!("not a number")], None),
            Err(RecorderError::Encoding(_))
        ));
    }
}
