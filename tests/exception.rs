use std::{any::TypeId, panic, sync::Arc};

use caught::{Exception, ExceptionRef, markers::Dynamic, prelude::*};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("operation failed with code {code}")]
struct CodedError {
    code: i32,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("request failed")]
struct WrappedError {
    #[source]
    cause: CodedError,
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display("parse failure at byte {offset}")]
struct ParseError {
    offset: usize,
}

/// A payload with no Display, Debug, or Error implementation at all.
#[derive(Clone, PartialEq)]
struct Opaque {
    detail: String,
}

fn rethrow_payload(exception: &Exception<Dynamic>) -> Box<dyn std::any::Any + Send> {
    // No AssertUnwindSafe needed: Exception is RefUnwindSafe
    panic::catch_unwind(|| exception.rethrow()).expect_err("rethrow should unwind")
}

#[test]
fn round_trip_preserves_value_and_type() {
    let exception = caught::capture(CodedError { code: 42 }).into_dynamic();

    let payload = rethrow_payload(&exception);
    let caught = payload
        .downcast::<CodedError>()
        .expect("payload should have the captured type");
    assert_eq!(caught.code, 42);
}

#[test]
fn rethrow_works_any_number_of_times() {
    let exception = caught::capture(CodedError { code: 42 }).into_dynamic();

    for _ in 0..3 {
        let payload = rethrow_payload(&exception);
        let caught = payload.downcast::<CodedError>().unwrap();
        assert_eq!(caught.code, 42);
    }

    // The handle is unchanged after all those rethrows
    assert_eq!(exception.downcast_ref::<CodedError>().unwrap().code, 42);
}

#[test]
fn capture_is_total() {
    // No formatting traits required
    let exception = caught::capture(Opaque {
        detail: "secret".to_string(),
    });

    assert_eq!(exception.value().detail, "secret");

    // The handle is still printable through its handler
    let output = format!("{exception}");
    assert!(output.contains("Opaque"));
    assert!(!output.contains("secret"));
}

#[test]
fn type_fidelity_rejects_other_types() {
    let exception = caught::capture(CodedError { code: 1 }).into_dynamic();

    let payload = rethrow_payload(&exception);
    // Downcasting to an unrelated type fails; the payload is the exact
    // captured type, not a stand-in
    let payload = payload.downcast::<ParseError>().unwrap_err();
    let payload = payload.downcast::<String>().unwrap_err();
    assert!(payload.downcast::<CodedError>().is_ok());
}

#[test]
fn sequential_captures_are_independent() {
    let first = caught::capture(CodedError { code: 1 }).into_dynamic();
    let second = caught::capture(ParseError { offset: 9 }).into_dynamic();

    assert!(first.is::<CodedError>());
    assert!(second.is::<ParseError>());

    let payload = rethrow_payload(&second);
    assert_eq!(payload.downcast::<ParseError>().unwrap().offset, 9);

    // Rethrowing the second capture did not disturb the first
    let payload = rethrow_payload(&first);
    assert_eq!(payload.downcast::<CodedError>().unwrap().code, 1);
}

#[test]
fn stateless_marker_round_trips() {
    #[derive(Debug, Clone, PartialEq)]
    struct QuotaExceeded;

    let exception = caught::capture(QuotaExceeded).into_dynamic();
    assert!(exception.is::<QuotaExceeded>());

    let payload = rethrow_payload(&exception);
    assert_eq!(*payload.downcast::<QuotaExceeded>().unwrap(), QuotaExceeded);
}

#[test]
fn downcast_value_extracts_payload() {
    let exception = caught::capture("payload".to_string()).into_dynamic();
    let exception = exception.downcast_value::<i32>().unwrap_err();
    assert_eq!(exception.downcast_value::<String>().unwrap(), "payload");
}

#[test]
fn clones_share_one_capture() {
    let exception = caught::capture("shared".to_string());
    assert_eq!(exception.strong_count(), 1);

    let clone = exception.clone();
    assert_eq!(exception.strong_count(), 2);
    assert_eq!(clone.value(), "shared");

    drop(clone);
    assert_eq!(exception.strong_count(), 1);
}

#[test]
fn handles_cross_threads() {
    let exception = caught::capture(CodedError { code: 7 }).into_dynamic();
    let clone = exception.clone();

    let handle = std::thread::spawn(move || {
        let payload = rethrow_payload(&clone);
        payload.downcast::<CodedError>().unwrap().code
    });

    assert_eq!(handle.join().unwrap(), 7);
    assert_eq!(exception.downcast_ref::<CodedError>().unwrap().code, 7);
}

#[test]
fn downcast_restores_typed_handle() {
    let exception = caught::capture(ParseError { offset: 3 }).into_dynamic();
    assert_eq!(exception.type_id(), TypeId::of::<ParseError>());

    let exception = exception.downcast::<CodedError>().unwrap_err();
    let typed: Exception<ParseError> = exception.downcast::<ParseError>().unwrap();
    assert_eq!(typed.value().offset, 3);
}

#[test]
fn try_into_inner_respects_sharing() {
    let exception = caught::capture("unique".to_string());
    assert_eq!(exception.try_into_inner().unwrap(), "unique");

    let exception = caught::capture("shared".to_string());
    let clone = exception.clone();
    let exception = exception.try_into_inner().unwrap_err();

    // into_inner falls back to cloning the value
    assert_eq!(exception.into_inner(), "shared");
    assert_eq!(clone.value(), "shared");
}

#[test]
fn source_chain_is_reachable() {
    let exception = Exception::new(WrappedError {
        cause: CodedError { code: 42 },
    });

    let source = exception.source().expect("wrapped error has a source");
    assert_eq!(source.to_string(), "operation failed with code 42");

    // Payloads without a source report none
    let exception = Exception::new(CodedError { code: 1 });
    assert!(exception.source().is_none());
}

#[test]
fn exception_macro_selects_handlers() {
    // Literal form captures the message itself
    let exception = exception!("plain message");
    assert_eq!(exception.type_id(), TypeId::of::<&'static str>());
    assert_eq!(format!("{exception}"), "plain message");

    // Format form produces a String payload
    let exception = exception!("failed after {} tries", 3);
    assert_eq!(exception.type_id(), TypeId::of::<String>());
    assert_eq!(format!("{exception}"), "failed after 3 tries");

    // Error types format through their Error implementation
    let exception: Exception<WrappedError> = exception!(WrappedError {
        cause: CodedError { code: 5 },
    });
    assert_eq!(format!("{exception}"), "request failed");
    assert!(exception.source().is_some());

    // Types with no traits at all still work
    let exception: Exception<Opaque> = exception!(Opaque {
        detail: "hidden".to_string(),
    });
    assert!(format!("{exception}").contains("Opaque"));
}

#[test]
fn throw_macro_raises_immediately() {
    let payload = panic::catch_unwind(|| {
        throw!(CodedError { code: 13 });
    })
    .expect_err("throw! should unwind");

    assert_eq!(payload.downcast::<CodedError>().unwrap().code, 13);
}

#[test]
fn exception_ref_inspection() {
    let exception = caught::capture(CodedError { code: 8 });
    let exception_ref: ExceptionRef<'_, CodedError> = exception.as_ref();

    assert_eq!(exception_ref.value().code, 8);
    assert_eq!(exception_ref.type_id(), TypeId::of::<CodedError>());
    assert_eq!(exception_ref.strong_count(), 1);

    let dynamic_ref = exception_ref.into_dynamic();
    assert_eq!(dynamic_ref.downcast_ref::<CodedError>().unwrap().code, 8);
    assert!(dynamic_ref.downcast_ref::<ParseError>().is_none());

    let owned = dynamic_ref.clone_arc();
    assert_eq!(exception.strong_count(), 2);
    drop(owned);
}

#[test]
fn error_conversion_through_question_mark() {
    fn fails() -> Result<(), Exception<CodedError>> {
        Err(CodedError { code: 2 })?;
        Ok(())
    }

    let exception = fails().unwrap_err();
    assert_eq!(exception.value().code, 2);
}

#[test]
fn arc_payloads_adapt_non_clone_errors() {
    // io::Error is not Clone, but Arc<io::Error> is
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let exception = exception!(Arc::new(io_error));

    assert!(format!("{exception}").contains("gone"));

    let exception = exception.into_dynamic();
    let payload = rethrow_payload(&exception);
    let caught = payload.downcast::<Arc<std::io::Error>>().unwrap();
    assert_eq!(caught.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn handle_sizes() {
    assert_eq!(
        std::mem::size_of::<Exception<Dynamic>>(),
        std::mem::size_of::<usize>()
    );
    assert_eq!(
        std::mem::size_of::<Option<Exception<Dynamic>>>(),
        std::mem::size_of::<usize>()
    );
    assert_eq!(
        std::mem::size_of::<Result<(), Exception<Dynamic>>>(),
        std::mem::size_of::<usize>()
    );
}

#[test]
fn thread_safety_guarantees() {
    static_assertions::assert_impl_all!(Exception<Dynamic>: Send, Sync);
    static_assertions::assert_impl_all!(Exception<CodedError>: Send, Sync);
    static_assertions::assert_impl_all!(ExceptionRef<'static, Dynamic>: Send, Sync, Copy);
}
