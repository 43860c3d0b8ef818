//! Datatype conversion tests, both direct and through bound properties.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use chrono::{DateTime, TimeZone, Utc};
    use url::Url;
    use uuid::Uuid;
    use xbind_binding::{
        BindError, BindResult, BindingContext, DataHandle, DatatypeConverter, HexBinary, Object,
        PropertyDescriptor, QName, TypeDescriptor, Value, XmlBind, XmlDuration,
    };

    use crate::{init_tracing, to_fragment};

    /// A record with one property per interesting datatype.
    #[derive(Debug, Clone, PartialEq)]
    struct Reading {
        taken_at: DateTime<Utc>,
        checksum: HexBinary,
        payload: Bytes,
        window: XmlDuration,
        source: Url,
        id: Uuid,
        unit: QName,
        attachment: DataHandle,
        grade: char,
    }

    impl XmlBind for Reading {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::structure::<Self>()
                .root_element("reading")
                .attribute::<Uuid>("id")
                .element::<DateTime<Utc>>("taken_at")
                .element::<HexBinary>("checksum")
                .element::<Bytes>("payload")
                .element::<XmlDuration>("window")
                .element::<Url>("source")
                .element::<QName>("unit")
                .property(
                    PropertyDescriptor::element::<DataHandle>("attachment").mime_type("text/plain"),
                )
                .element::<char>("grade")
                .build()
        }

        fn to_value(&self) -> Value {
            Object::of::<Self>()
                .with("taken_at", self.taken_at.to_value())
                .with("checksum", self.checksum.to_value())
                .with("payload", self.payload.to_value())
                .with("window", self.window.to_value())
                .with("source", self.source.to_value())
                .with("id", self.id.to_value())
                .with("unit", self.unit.to_value())
                .with("attachment", self.attachment.to_value())
                .with("grade", self.grade.to_value())
                .into()
        }

        fn from_value(value: Value) -> BindResult<Self> {
            let mut object = value.into_object()?;
            Ok(Self {
                taken_at: object.take("taken_at")?,
                checksum: object.take("checksum")?,
                payload: object.take("payload")?,
                window: object.take("window")?,
                source: object.take("source")?,
                id: object.take("id")?,
                unit: object.take("unit")?,
                attachment: object.take("attachment")?,
                grade: object.take("grade")?,
            })
        }
    }

    fn reading_context() -> BindingContext {
        init_tracing();
        BindingContext::builder()
            .register::<Reading>()
            .build()
            .expect("context")
    }

    fn sample() -> Reading {
        Reading {
            taken_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).single().expect("instant"),
            checksum: HexBinary(b"Hello".to_vec()),
            payload: Bytes::from_static(b"raw bytes"),
            window: XmlDuration::from_seconds(90_061),
            source: Url::parse("https://example.com/sensors/7").expect("url"),
            id: Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef),
            unit: QName::new("urn:units", "celsius").with_prefix("u"),
            attachment: DataHandle::new(Some("text/csv"), Bytes::from_static(b"a,b\n1,2\n")),
            grade: 'A',
        }
    }

    #[test]
    fn test_should_decode_hex_binary() {
        let conv = DatatypeConverter::new();
        assert_eq!(conv.parse_hex_binary("48656C6C6F").expect("hex"), b"Hello");
        assert_eq!(conv.parse_hex_binary("48656c6c6f").expect("hex"), b"Hello");
        assert_eq!(conv.print_hex_binary(b"Hello"), "48656C6C6F");
        let err = conv.parse_hex_binary("ABC").expect_err("odd length");
        assert_eq!(err.datatype, "hexBinary");
    }

    #[test]
    fn test_should_print_date_time_with_colon_offset_and_reparse() {
        let conv = DatatypeConverter::new();
        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().expect("instant");
        let text = conv.print_date_time(&instant);
        assert_eq!(text, "2024-05-01T12:00:00+00:00");
        assert_eq!(conv.parse_date_time(&text).expect("parse"), instant);
        let shifted = conv
            .parse_date_time("2024-05-01T14:00:00+02:00")
            .expect("offset");
        assert_eq!(shifted, instant);
    }

    #[test]
    fn test_should_round_trip_every_datatype_through_binding() {
        let context = reading_context();
        let reading = sample();
        let xml = to_fragment(&context, &reading.to_value()).expect("marshal");
        assert!(xml.contains("<checksum>48656C6C6F</checksum>"), "{xml}");
        assert!(xml.contains("<takenAt>2024-05-01T12:30:00+00:00</takenAt>"), "{xml}");
        assert!(xml.contains("<window>P1DT1H1M1S</window>"), "{xml}");
        assert!(xml.contains(r#"xmlns:u="urn:units""#), "{xml}");
        assert!(xml.contains("<unit"), "{xml}");
        assert!(xml.contains(">u:celsius</unit>"), "{xml}");
        assert!(xml.contains("<grade>A</grade>"), "{xml}");
        assert!(xml.contains(r#"xmime:contentType="text/csv""#), "{xml}");

        let back: Reading = context
            .unmarshaller()
            .unmarshal(xml.as_bytes())
            .expect("unmarshal");
        assert_eq!(back, reading);
    }

    #[test]
    fn test_should_report_odd_hex_as_invalid_lexical_value() {
        let context = reading_context();
        let xml = to_fragment(&context, &sample().to_value())
            .expect("marshal")
            .replace("48656C6C6F", "ABC");
        let err = context
            .unmarshaller()
            .unmarshal_value(xml.as_bytes())
            .expect_err("odd hex");
        assert!(matches!(err, BindError::InvalidLexicalValue(ref e) if e.datatype == "hexBinary"));
    }

    #[test]
    fn test_should_reject_relative_uri() {
        let context = reading_context();
        let xml = to_fragment(&context, &sample().to_value())
            .expect("marshal")
            .replace("https://example.com/sensors/7", "sensors/7");
        let err = context
            .unmarshaller()
            .unmarshal_value(xml.as_bytes())
            .expect_err("relative uri");
        assert!(matches!(err, BindError::InvalidLexicalValue(_)), "{err}");
    }

    #[test]
    fn test_should_fall_back_to_declared_mime_type() {
        let context = reading_context();
        let xml = to_fragment(&context, &sample().to_value())
            .expect("marshal")
            .replace(r#" xmime:contentType="text/csv""#, "");
        let back: Reading = context
            .unmarshaller()
            .unmarshal(xml.as_bytes())
            .expect("unmarshal");
        assert_eq!(back.attachment.content_type.as_deref(), Some("text/plain"));
        assert_eq!(back.attachment.data, sample().attachment.data);
    }

    #[test]
    fn test_should_reject_negative_unsigned_values() {
        let conv = DatatypeConverter::new();
        let err = conv.parse_unsigned_byte("-1").expect_err("negative");
        assert!(err.to_string().contains("negative"), "{err}");
        assert_eq!(conv.parse_unsigned_byte(" 255 ").expect("max"), 255);
        assert!(conv.parse_unsigned_byte("256").is_err());
    }
}
