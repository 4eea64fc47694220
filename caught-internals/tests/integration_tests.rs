use core::{
    any::TypeId,
    error::Error,
    fmt::{self, Display, Formatter},
};

use caught_internals::{RawException, RawExceptionRef, handlers::ExceptionHandler};

#[derive(Debug, Clone, PartialEq)]
struct ErrorCode(i32);

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "error code {}", self.0)
    }
}

impl Error for ErrorCode {}

struct ErrorCodeHandler;

impl ExceptionHandler<ErrorCode> for ErrorCodeHandler {
    fn source(value: &ErrorCode) -> Option<&(dyn Error + 'static)> {
        value.source()
    }

    fn display(value: &ErrorCode, formatter: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(value, formatter)
    }

    fn debug(value: &ErrorCode, formatter: &mut Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(value, formatter)
    }
}

struct StringHandler;

impl ExceptionHandler<String> for StringHandler {
    fn source(_value: &String) -> Option<&(dyn Error + 'static)> {
        None
    }

    fn display(value: &String, formatter: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(value, formatter)
    }

    fn debug(value: &String, formatter: &mut Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(value, formatter)
    }
}

/// Adapter so we can exercise the vtable formatting paths through the
/// standard formatting machinery.
struct DisplayVia<'a>(RawExceptionRef<'a>);

impl Display for DisplayVia<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.display(f)
    }
}

struct DebugVia<'a>(RawExceptionRef<'a>);

impl fmt::Debug for DebugVia<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.debug(f)
    }
}

#[test]
fn test_exception_creation() {
    let exception = RawException::new::<_, ErrorCodeHandler>(ErrorCode(42));
    let exception_ref = exception.as_ref();

    assert_eq!(exception_ref.type_id(), TypeId::of::<ErrorCode>());
    assert_eq!(exception_ref.handler_type_id(), TypeId::of::<ErrorCodeHandler>());
    assert!(exception_ref.type_name().contains("ErrorCode"));
    assert_eq!(exception_ref.strong_count(), 1);
}

#[test]
fn test_exception_formatting() {
    let exception = RawException::new::<_, ErrorCodeHandler>(ErrorCode(42));
    let exception_ref = exception.as_ref();

    assert_eq!(format!("{}", DisplayVia(exception_ref)), "error code 42");
    assert_eq!(format!("{:?}", DebugVia(exception_ref)), "ErrorCode(42)");
}

#[test]
fn test_exception_source() {
    let exception = RawException::new::<_, ErrorCodeHandler>(ErrorCode(42));
    assert!(exception.as_ref().source().is_none());

    let exception = RawException::new::<_, StringHandler>(String::from("plain"));
    assert!(exception.as_ref().source().is_none());
}

#[test]
fn test_exception_clone_arc_refcounts() {
    let exception = RawException::new::<_, StringHandler>(String::from("shared"));
    assert_eq!(exception.as_ref().strong_count(), 1);

    let clone_a = exception.as_ref().clone_arc();
    let clone_b = clone_a.as_ref().clone_arc();
    assert_eq!(exception.as_ref().strong_count(), 3);

    // All clones point at the same underlying value
    assert_eq!(exception.as_ref().type_id(), clone_a.as_ref().type_id());
    assert_eq!(exception.as_ref().type_id(), clone_b.as_ref().type_id());

    drop(clone_a);
    drop(clone_b);
    assert_eq!(exception.as_ref().strong_count(), 1);
}

#[test]
fn test_exception_downcast() {
    let exception = RawException::new::<_, ErrorCodeHandler>(ErrorCode(42));
    let exception_ref = exception.as_ref();

    assert_eq!(exception_ref.type_id(), TypeId::of::<ErrorCode>());

    // SAFETY: We just verified that the stored type is `ErrorCode`
    let value = unsafe { exception_ref.value_downcast_unchecked::<ErrorCode>() };
    assert_eq!(value, &ErrorCode(42));
}

#[test]
fn test_clone_boxed_payload_independence() {
    let exception = RawException::new::<_, ErrorCodeHandler>(ErrorCode(42));

    let payload_a = exception.as_ref().clone_boxed();
    let payload_b = exception.as_ref().clone_boxed();

    let payload_a: Box<ErrorCode> = payload_a.downcast().expect("payload should be an ErrorCode");
    let payload_b: Box<ErrorCode> = payload_b.downcast().expect("payload should be an ErrorCode");

    assert_eq!(*payload_a, ErrorCode(42));
    assert_eq!(*payload_b, ErrorCode(42));

    // Minting payloads does not disturb the reference count of the handle
    assert_eq!(exception.as_ref().strong_count(), 1);
}

#[test]
fn test_into_inner_unchecked() {
    let exception = RawException::new::<_, StringHandler>(String::from("unique"));
    assert_eq!(exception.as_ref().strong_count(), 1);

    // SAFETY: The stored type is `String` and the strong count is 1
    let value = unsafe { exception.into_inner_unchecked::<String>() };
    assert_eq!(value, "unique");
}
