mod common;

use common::{RecordingNative, bridge_with};
use hostbridge::{
    Bridge, BridgeError, ErrorKind, ExternalCall, Handle, HostFunction, HostValue,
};

const SUM: usize = 0x100;
const FAIL: usize = 0x200;
const JOIN: usize = 0x300;
const ARG_COUNT: usize = 0x400;
const BAD_RESULT: usize = 0x500;
const CALL_BACK: usize = 0x600;

fn sum_handler(bridge: &mut Bridge, call: &ExternalCall<'_>) -> Handle {
    let mut total = 0.0;
    for arg in call.args.iter() {
        total += bridge.number_value(arg).unwrap_or(0.0);
    }
    bridge.create_number(total).unwrap()
}

fn fail_handler(bridge: &mut Bridge, _call: &ExternalCall<'_>) -> Handle {
    bridge.create_error(ErrorKind::Range, "native failure").unwrap()
}

fn join_handler(bridge: &mut Bridge, call: &ExternalCall<'_>) -> Handle {
    let mut parts = Vec::new();
    for arg in call.args.iter() {
        parts.push(bridge.string_value(arg).unwrap().to_string());
    }
    bridge.create_string(&parts.join(",")).unwrap()
}

fn arg_count_handler(bridge: &mut Bridge, call: &ExternalCall<'_>) -> Handle {
    bridge.create_number(call.arg_count() as f64).unwrap()
}

fn bad_result_handler(_bridge: &mut Bridge, _call: &ExternalCall<'_>) -> Handle {
    Handle::from_raw(9_999)
}

fn call_back_handler(bridge: &mut Bridge, call: &ExternalCall<'_>) -> Handle {
    let callee = call.arg(0).expect("callee argument");
    let rest: Vec<Handle> = call.args.iter().skip(1).collect();
    bridge.call_function(callee, call.this, &rest).unwrap()
}

fn throwing_builtin(_this: &HostValue, args: &[HostValue]) -> Result<HostValue, HostValue> {
    Err(args.first().cloned().unwrap_or(HostValue::Undefined))
}

fn echo_this_builtin(this: &HostValue, _args: &[HostValue]) -> Result<HostValue, HostValue> {
    Ok(this.clone())
}

fn external(bridge: &mut Bridge, function_ptr: usize) -> HostValue {
    let handle = bridge.create_external_function(function_ptr).unwrap();
    bridge.resolve(handle).unwrap().clone()
}

#[test]
fn three_arguments_release_all_temporaries() {
    let native = RecordingNative::new();
    native.handle(SUM, sum_handler);
    let mut bridge = bridge_with(&native);

    let f = bridge.create_external_function(SUM).unwrap();
    let function = bridge.resolve(f).unwrap().clone();
    let receiver = HostValue::new_object();
    let args = [
        HostValue::Number(1.0),
        HostValue::Number(2.0),
        HostValue::Number(3.0),
    ];

    let result = bridge.call(&function, &receiver, &args).unwrap();
    assert_eq!(result, HostValue::Number(6.0));

    let call = native.last_call();
    assert_eq!(call.function_ptr, SUM);
    assert_eq!(call.function, f);
    assert_eq!(call.args.len(), 3);
    // Function held by the test plus the call; everything else only by the call.
    assert_eq!(call.ref_counts, vec![2, 1, 1, 1, 1]);

    assert_eq!(bridge.ref_count(f).unwrap(), 1);
    assert!(bridge.resolve(call.this).is_err());
    for arg in &call.args {
        assert_eq!(bridge.ref_count(*arg).unwrap(), 0);
    }
    // The result value (6) was released after extraction.
    let six = bridge.table().find(&HostValue::Number(6.0)).unwrap();
    assert_eq!(bridge.ref_count(six).unwrap(), 0);
}

#[test]
fn error_result_is_raised_and_temporaries_released() {
    let native = RecordingNative::new();
    native.handle(FAIL, fail_handler);
    let mut bridge = bridge_with(&native);

    let function = external(&mut bridge, FAIL);
    let receiver = HostValue::new_object();
    let arg = HostValue::new_object();

    let err = bridge
        .call(&function, &receiver, std::slice::from_ref(&arg))
        .unwrap_err();
    match err {
        BridgeError::Call(HostValue::Object(thrown)) => {
            assert_eq!(thrown.error_kind(), Some(ErrorKind::Range));
            assert_eq!(thrown.get("message"), Some(HostValue::string("native failure")));
        }
        other => panic!("expected thrown error object, got {:?}", other),
    }

    assert_eq!(bridge.table().find(&receiver), None);
    assert_eq!(bridge.table().find(&arg), None);
    assert_eq!(bridge.stats().reference_entries, 1);
}

#[test]
fn zero_arguments_are_valid() {
    let native = RecordingNative::new();
    native.handle(ARG_COUNT, arg_count_handler);
    let mut bridge = bridge_with(&native);

    let function = external(&mut bridge, ARG_COUNT);
    let result = bridge.call(&function, &HostValue::Undefined, &[]).unwrap();
    assert_eq!(result, HostValue::Number(0.0));
    assert!(native.last_call().args.is_empty());
}

#[test]
fn argument_order_is_preserved() {
    let native = RecordingNative::new();
    native.handle(JOIN, join_handler);
    let mut bridge = bridge_with(&native);

    let function = external(&mut bridge, JOIN);
    let args = ["c", "a", "b"].map(HostValue::string);
    let result = bridge.call(&function, &HostValue::Null, &args).unwrap();
    assert_eq!(result, HostValue::string("c,a,b"));
}

#[test]
fn repeated_argument_is_counted_per_position() {
    let native = RecordingNative::new();
    native.handle(ARG_COUNT, arg_count_handler);
    let mut bridge = bridge_with(&native);

    let function = external(&mut bridge, ARG_COUNT);
    let shared = HostValue::new_object();
    let args = [shared.clone(), shared.clone()];
    bridge.call(&function, &HostValue::Undefined, &args).unwrap();

    let call = native.last_call();
    assert_eq!(call.args[0], call.args[1]);
    assert_eq!(call.ref_counts[2], 2);
    assert_eq!(bridge.table().find(&shared), None);
}

#[test]
fn unknown_result_handle_still_releases_temporaries() {
    let native = RecordingNative::new();
    native.handle(BAD_RESULT, bad_result_handler);
    let mut bridge = bridge_with(&native);

    let function = external(&mut bridge, BAD_RESULT);
    let arg = HostValue::new_object();
    let err = bridge
        .call(&function, &HostValue::Undefined, std::slice::from_ref(&arg))
        .unwrap_err();
    assert!(matches!(err, BridgeError::UnknownHandle(h) if h == Handle::from_raw(9_999)));
    assert_eq!(bridge.table().find(&arg), None);
}

#[test]
fn calling_a_non_function_fails() {
    let native = RecordingNative::new();
    let mut bridge = bridge_with(&native);
    let err = bridge
        .call(&HostValue::Number(1.0), &HostValue::Undefined, &[])
        .unwrap_err();
    assert!(matches!(err, BridgeError::NotCallable { type_name: "number" }));
}

#[test]
fn builtin_throw_becomes_call_error() {
    let native = RecordingNative::new();
    let mut bridge = bridge_with(&native);
    let function = HostValue::from_function(HostFunction::builtin("throw", throwing_builtin));

    let err = bridge
        .call(&function, &HostValue::Undefined, &[HostValue::string("boom")])
        .unwrap_err();
    assert_eq!(err.thrown_value(), Some(&HostValue::string("boom")));
}

#[test]
fn native_call_function_flags_thrown_values() {
    let native = RecordingNative::new();
    let mut bridge = bridge_with(&native);

    let thrower = bridge
        .ref_value(&HostValue::from_function(HostFunction::builtin(
            "throw",
            throwing_builtin,
        )))
        .unwrap();
    let this = bridge.create_undefined().unwrap();
    let payload = bridge.create_object().unwrap();

    let result = bridge.call_function(thrower, this, &[payload]).unwrap();
    assert!(bridge.has_error(result).unwrap());
    assert_eq!(result, payload);
    assert_eq!(bridge.ref_count(payload).unwrap(), 2);
}

#[test]
fn native_call_function_on_non_function_yields_type_error() {
    let native = RecordingNative::new();
    let mut bridge = bridge_with(&native);

    let not_callable = bridge.create_number(4.0).unwrap();
    let this = bridge.create_undefined().unwrap();
    let result = bridge.call_function(not_callable, this, &[]).unwrap();

    assert!(bridge.has_error(result).unwrap());
    assert!(bridge.is_error(result).unwrap());
    let message = bridge.get_property(result, "message").unwrap();
    assert_eq!(
        bridge.string_value(message).unwrap().as_ref(),
        "number is not a function"
    );
}

#[test]
fn native_call_function_passes_receiver() {
    let native = RecordingNative::new();
    let mut bridge = bridge_with(&native);

    let echo = bridge
        .ref_value(&HostValue::from_function(HostFunction::builtin(
            "echo_this",
            echo_this_builtin,
        )))
        .unwrap();
    let this = bridge.create_object().unwrap();
    let result = bridge.call_function(echo, this, &[]).unwrap();
    assert_eq!(result, this);
    assert!(!bridge.has_error(result).unwrap());
}

#[test]
fn native_handler_can_call_back_into_host() {
    let native = RecordingNative::new();
    native.handle(CALL_BACK, call_back_handler);
    native.handle(SUM, sum_handler);
    let mut bridge = bridge_with(&native);

    let outer = external(&mut bridge, CALL_BACK);
    let inner = external(&mut bridge, SUM);
    let result = bridge
        .call(
            &outer,
            &HostValue::Undefined,
            &[inner, HostValue::Number(4.0), HostValue::Number(5.0)],
        )
        .unwrap();

    assert_eq!(result, HostValue::Number(9.0));
    assert_eq!(native.call_count(), 2);
}

#[test]
fn nested_error_propagates_through_outer_call() {
    let native = RecordingNative::new();
    native.handle(CALL_BACK, call_back_handler);
    native.handle(FAIL, fail_handler);
    let mut bridge = bridge_with(&native);

    let outer = external(&mut bridge, CALL_BACK);
    let inner = external(&mut bridge, FAIL);
    let err = bridge
        .call(&outer, &HostValue::Undefined, &[inner])
        .unwrap_err();
    assert!(matches!(err, BridgeError::Call(HostValue::Object(_))));
}
