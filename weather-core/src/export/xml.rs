use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};
use serde_json::Value;

use super::{ExportError, scalar_text};

const ROOT: &str = "weatherData";

/// One element per object field; arrays repeat the singularized field name.
pub(super) fn render(value: &Value) -> Result<String, ExportError> {
    let mut writer = Writer::new(Vec::new());
    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_element(&mut writer, ROOT, value)?;

    String::from_utf8(writer.into_inner()).map_err(|e| ExportError::Xml(e.to_string()))
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> Result<(), ExportError> {
    match value {
        Value::Array(items) => {
            let item_name = singular(name);
            for item in items {
                write_element(writer, item_name, item)?;
            }
        }
        Value::Object(fields) => {
            emit(writer, Event::Start(BytesStart::new(name)))?;
            for (key, field) in fields {
                write_element(writer, key, field)?;
            }
            emit(writer, Event::End(BytesEnd::new(name)))?;
        }
        scalar => {
            // Start and end are written separately so null stays `<tag></tag>`.
            emit(writer, Event::Start(BytesStart::new(name)))?;
            let text = scalar_text(scalar);
            if !text.is_empty() {
                emit(writer, Event::Text(BytesText::new(&text)))?;
            }
            emit(writer, Event::End(BytesEnd::new(name)))?;
        }
    }
    Ok(())
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), ExportError> {
    writer.write_event(event).map_err(|e| ExportError::Xml(e.to_string()))
}

fn singular(name: &str) -> &str {
    name.strip_suffix('s').filter(|s| !s.is_empty()).unwrap_or(name)
}
