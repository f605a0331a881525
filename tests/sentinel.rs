use musette::sentinel::{Sentinel, convert};

#[test]
fn reserved_maximum_is_absent_per_width() {
    assert_eq!(u8::MAX.present(), None);
    assert_eq!(u16::MAX.present(), None);
    assert_eq!(u32::MAX.present(), None);
    assert_eq!(i8::MAX.present(), None);
    assert_eq!(i16::MAX.present(), None);
    assert_eq!(i32::MAX.present(), None);
}

#[test]
fn one_below_reserved_is_present() {
    assert_eq!((u8::MAX - 1).present(), Some(254));
    assert_eq!((u16::MAX - 1).present(), Some(65534));
    assert_eq!((u32::MAX - 1).present(), Some(u32::MAX - 1));
    assert_eq!((i32::MAX - 1).present(), Some(i32::MAX - 1));
}

#[test]
fn zero_and_negatives_are_real_measurements() {
    assert_eq!(0u16.present(), Some(0));
    assert_eq!((-40i8).present(), Some(-40));
    assert_eq!(i32::MIN.present(), Some(i32::MIN));
}

#[test]
fn check_runs_before_conversion() {
    // The reserved encoding must never reach the conversion formula.
    assert_eq!(convert(u32::MAX, |v| v as f64 / 100.0), None);
    assert_eq!(convert(25_000u32, |v| v as f64 / 100.0), Some(250.0));
}
