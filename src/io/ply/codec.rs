//! PLY element stream.
//!
//! Parses and writes the PLY header, then moves typed records in or out one
//! at a time. Every scalar travels as `f64`; integer and `float` values are
//! exact in that representation, so nothing is lost between the stream and
//! the caller.

use std::io::{self, BufRead, Read, Write};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::{MeshIoError, Result};
use crate::io::write_real;

/// PLY body encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlyEncoding {
    /// ASCII text format (human-readable)
    #[default]
    Ascii,
    /// Binary little-endian format
    BinaryLittleEndian,
    /// Binary big-endian format
    BinaryBigEndian,
}

impl PlyEncoding {
    pub fn keyword(self) -> &'static str {
        match self {
            PlyEncoding::Ascii => "ascii",
            PlyEncoding::BinaryLittleEndian => "binary_little_endian",
            PlyEncoding::BinaryBigEndian => "binary_big_endian",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "ascii" => Some(PlyEncoding::Ascii),
            "binary_little_endian" => Some(PlyEncoding::BinaryLittleEndian),
            "binary_big_endian" => Some(PlyEncoding::BinaryBigEndian),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
}

impl ScalarType {
    /// Accepts both the classic (`uchar`) and sized (`uint8`) spellings.
    pub fn from_name(name: &str) -> Option<Self> {
        let ty = match name {
            "char" | "int8" => ScalarType::Int8,
            "uchar" | "uint8" => ScalarType::UInt8,
            "short" | "int16" => ScalarType::Int16,
            "ushort" | "uint16" => ScalarType::UInt16,
            "int" | "int32" => ScalarType::Int32,
            "uint" | "uint32" => ScalarType::UInt32,
            "float" | "float32" => ScalarType::Float32,
            "double" | "float64" => ScalarType::Float64,
            _ => return None,
        };
        Some(ty)
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Int8 => "char",
            ScalarType::UInt8 => "uchar",
            ScalarType::Int16 => "short",
            ScalarType::UInt16 => "ushort",
            ScalarType::Int32 => "int",
            ScalarType::UInt32 => "uint",
            ScalarType::Float32 => "float",
            ScalarType::Float64 => "double",
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, ScalarType::Float32 | ScalarType::Float64)
    }

    /// Largest value the type can hold.
    pub fn max_value(self) -> f64 {
        match self {
            ScalarType::Int8 => i8::MAX as f64,
            ScalarType::UInt8 => u8::MAX as f64,
            ScalarType::Int16 => i16::MAX as f64,
            ScalarType::UInt16 => u16::MAX as f64,
            ScalarType::Int32 => i32::MAX as f64,
            ScalarType::UInt32 => u32::MAX as f64,
            ScalarType::Float32 => f32::MAX as f64,
            ScalarType::Float64 => f64::MAX,
        }
    }

    /// Rounds an ASCII value through the declared type so text and binary
    /// bodies yield the same numbers.
    fn narrow(self, value: f64) -> f64 {
        match self {
            ScalarType::Float32 => value as f32 as f64,
            ScalarType::Float64 => value,
            _ => value.trunc(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Scalar(ScalarType),
    List { count: ScalarType, item: ScalarType },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: String,
    pub kind: PropertyKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDef {
    pub name: String,
    pub count: usize,
    pub properties: Vec<PropertyDef>,
}

impl ElementDef {
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
            properties: Vec::new(),
        }
    }

    pub fn with_scalar(mut self, name: impl Into<String>, ty: ScalarType) -> Self {
        self.properties.push(PropertyDef {
            name: name.into(),
            kind: PropertyKind::Scalar(ty),
        });
        self
    }

    pub fn with_list(mut self, name: impl Into<String>, count: ScalarType, item: ScalarType) -> Self {
        self.properties.push(PropertyDef {
            name: name.into(),
            kind: PropertyKind::List { count, item },
        });
        self
    }

    /// Position and definition of the property called `name`.
    pub fn property(&self, name: &str) -> Option<(usize, &PropertyDef)> {
        self.properties
            .iter()
            .enumerate()
            .find(|(_, p)| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlyHeader {
    pub encoding: PlyEncoding,
    pub comments: Vec<String>,
    pub obj_info: Vec<String>,
    pub elements: Vec<ElementDef>,
}

impl PlyHeader {
    pub fn new(encoding: PlyEncoding) -> Self {
        Self {
            encoding,
            ..Self::default()
        }
    }

    pub fn element(&self, name: &str) -> Option<(usize, &ElementDef)> {
        self.elements
            .iter()
            .enumerate()
            .find(|(_, e)| e.name == name)
    }

    /// Reads the header up to and including `end_header`.
    ///
    /// Returns the header and the number of lines it spans.
    fn read<R: BufRead>(reader: &mut R, origin: &str) -> Result<(Self, usize)> {
        let mut bytes = Vec::new();
        let mut number = 0usize;
        let mut encoding = None;
        let mut header = PlyHeader::default();

        loop {
            bytes.clear();
            let n = reader
                .read_until(b'\n', &mut bytes)
                .map_err(|e| MeshIoError::io(origin, e))?;
            if n == 0 {
                return Err(MeshIoError::format(origin, number, "end_header not found"));
            }
            number += 1;

            let text = std::str::from_utf8(&bytes)
                .map_err(|_| MeshIoError::format(origin, number, "header line is not valid UTF-8"))?
                .trim();
            let err = |message: String| MeshIoError::format(origin, number, message);

            if number == 1 {
                if text != "ply" {
                    return Err(err(format!("expected 'ply' magic, found '{}'", text)));
                }
                continue;
            }

            let (keyword, rest) = crate::command::split_keyword(text);
            let mut words = rest.split_whitespace();
            match keyword {
                "" => {}
                "format" => {
                    let name = words.next().unwrap_or_default();
                    encoding = Some(
                        PlyEncoding::from_keyword(name)
                            .ok_or_else(|| err(format!("unknown format '{}'", name)))?,
                    );
                }
                "comment" => header.comments.push(rest.to_string()),
                "obj_info" => header.obj_info.push(rest.to_string()),
                "element" => {
                    let (name, count) = match (words.next(), words.next().map(str::parse::<usize>)) {
                        (Some(name), Some(Ok(count))) => (name, count),
                        _ => return Err(err(format!("invalid element line '{}'", text))),
                    };
                    header.elements.push(ElementDef::new(name, count));
                }
                "property" => {
                    let element = header
                        .elements
                        .last_mut()
                        .ok_or_else(|| err("property declared before any element".to_string()))?;
                    let property = parse_property(rest).ok_or_else(|| err(format!("invalid property line '{}'", text)))?;
                    element.properties.push(property);
                }
                "end_header" => break,
                other => return Err(err(format!("unknown header keyword '{}'", other))),
            }
        }

        header.encoding = encoding.ok_or_else(|| MeshIoError::format(origin, number, "format line missing"))?;
        Ok((header, number))
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "ply")?;
        writeln!(writer, "format {} 1.0", self.encoding.keyword())?;
        for comment in &self.comments {
            writeln!(writer, "comment {}", comment)?;
        }
        for info in &self.obj_info {
            writeln!(writer, "obj_info {}", info)?;
        }
        for element in &self.elements {
            writeln!(writer, "element {} {}", element.name, element.count)?;
            for property in &element.properties {
                match property.kind {
                    PropertyKind::Scalar(ty) => writeln!(writer, "property {} {}", ty.name(), property.name)?,
                    PropertyKind::List { count, item } => writeln!(
                        writer,
                        "property list {} {} {}",
                        count.name(),
                        item.name(),
                        property.name
                    )?,
                }
            }
        }
        writeln!(writer, "end_header")
    }
}

fn parse_property(rest: &str) -> Option<PropertyDef> {
    let words: Vec<&str> = rest.split_whitespace().collect();
    let kind = match words.as_slice() {
        ["list", count, item, _] => PropertyKind::List {
            count: ScalarType::from_name(count).filter(|t| t.is_integer())?,
            item: ScalarType::from_name(item)?,
        },
        [ty, _] => PropertyKind::Scalar(ScalarType::from_name(ty)?),
        _ => return None,
    };
    let name = words.last()?.to_string();
    Some(PropertyDef { name, kind })
}

/// One property value of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Scalar(f64),
    List(Vec<f64>),
}

impl PropertyValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            PropertyValue::Scalar(v) => Some(*v),
            PropertyValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[f64]> {
        match self {
            PropertyValue::List(items) => Some(items),
            PropertyValue::Scalar(_) => None,
        }
    }
}

/// Sequential record reader over a PLY stream.
pub struct ElementReader<R> {
    reader: R,
    origin: String,
    header: PlyHeader,
    bytes: Vec<u8>,
    line_number: usize,
    element: usize,
    record: usize,
}

impl<R: BufRead> ElementReader<R> {
    /// Consumes the header, leaving the reader at the first record.
    pub fn new(mut reader: R, origin: impl Into<String>) -> Result<Self> {
        let origin = origin.into();
        let (header, line_number) = PlyHeader::read(&mut reader, &origin)?;
        Ok(Self {
            reader,
            origin,
            header,
            bytes: Vec::new(),
            line_number,
            element: 0,
            record: 0,
        })
    }

    pub fn header(&self) -> &PlyHeader {
        &self.header
    }

    /// Reads the next record into `values`, one entry per property.
    ///
    /// Returns the index of the element the record belongs to, or `None`
    /// once every declared record has been read.
    pub fn next_record(&mut self, values: &mut Vec<PropertyValue>) -> Result<Option<usize>> {
        while self
            .header
            .elements
            .get(self.element)
            .is_some_and(|e| self.record >= e.count)
        {
            self.element += 1;
            self.record = 0;
        }
        let Some(element) = self.header.elements.get(self.element) else {
            return Ok(None);
        };

        values.clear();
        let context = RecordContext {
            origin: &self.origin,
            element: &element.name,
            record: self.record,
        };
        match self.header.encoding {
            PlyEncoding::Ascii => read_ascii_record(
                &mut self.reader,
                &mut self.bytes,
                &mut self.line_number,
                element,
                &context,
                values,
            )?,
            PlyEncoding::BinaryLittleEndian => {
                read_binary_record::<LittleEndian, _>(&mut self.reader, element, values)
                    .map_err(|e| context.binary_error(e))?
            }
            PlyEncoding::BinaryBigEndian => {
                read_binary_record::<BigEndian, _>(&mut self.reader, element, values)
                    .map_err(|e| context.binary_error(e))?
            }
        }

        let index = self.element;
        self.record += 1;
        Ok(Some(index))
    }
}

struct RecordContext<'a> {
    origin: &'a str,
    element: &'a str,
    record: usize,
}

impl RecordContext<'_> {
    fn error(&self, line: usize, message: impl std::fmt::Display) -> MeshIoError {
        MeshIoError::format(
            self.origin,
            line,
            format!("element '{}' record {}: {}", self.element, self.record, message),
        )
    }

    fn binary_error(&self, e: io::Error) -> MeshIoError {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => self.error(0, "unexpected end of data"),
            io::ErrorKind::InvalidData => self.error(0, e),
            _ => MeshIoError::io(self.origin, e),
        }
    }
}

/// Converts a list count to a length, rejecting negative or fractional values.
fn list_len(count: f64) -> Option<usize> {
    (count >= 0.0 && count.fract() == 0.0 && count <= u32::MAX as f64).then_some(count as usize)
}

fn read_ascii_record<R: BufRead>(
    reader: &mut R,
    bytes: &mut Vec<u8>,
    line_number: &mut usize,
    element: &ElementDef,
    context: &RecordContext<'_>,
    values: &mut Vec<PropertyValue>,
) -> Result<()> {
    loop {
        bytes.clear();
        let n = reader
            .read_until(b'\n', bytes)
            .map_err(|e| MeshIoError::io(context.origin, e))?;
        if n == 0 {
            return Err(context.error(*line_number, "unexpected end of data"));
        }
        *line_number += 1;
        if !bytes.iter().all(u8::is_ascii_whitespace) {
            break;
        }
    }

    let line = *line_number;
    let text = std::str::from_utf8(bytes).map_err(|_| context.error(line, "line is not valid UTF-8"))?;
    let mut tokens = text.split_whitespace();
    let mut next_value = |property: &PropertyDef, ty: ScalarType| -> Result<f64> {
        let token = tokens
            .next()
            .ok_or_else(|| context.error(line, format!("missing value for property '{}'", property.name)))?;
        let value: f64 = token.parse().map_err(|_| {
            context.error(
                line,
                format!("'{}' is not a number (property '{}')", token, property.name),
            )
        })?;
        Ok(ty.narrow(value))
    };

    for property in &element.properties {
        match property.kind {
            PropertyKind::Scalar(ty) => values.push(PropertyValue::Scalar(next_value(property, ty)?)),
            PropertyKind::List { count, item } => {
                let raw = next_value(property, count)?;
                let len = list_len(raw)
                    .ok_or_else(|| context.error(line, format!("invalid list length {}", raw)))?;
                let mut items = Vec::with_capacity(len.min(256));
                for _ in 0..len {
                    items.push(next_value(property, item)?);
                }
                values.push(PropertyValue::List(items));
            }
        }
    }

    if tokens.next().is_some() {
        return Err(context.error(line, "more values than declared properties"));
    }
    Ok(())
}

fn read_scalar<B: ByteOrder, R: Read>(reader: &mut R, ty: ScalarType) -> io::Result<f64> {
    let value = match ty {
        ScalarType::Int8 => reader.read_i8()? as f64,
        ScalarType::UInt8 => reader.read_u8()? as f64,
        ScalarType::Int16 => reader.read_i16::<B>()? as f64,
        ScalarType::UInt16 => reader.read_u16::<B>()? as f64,
        ScalarType::Int32 => reader.read_i32::<B>()? as f64,
        ScalarType::UInt32 => reader.read_u32::<B>()? as f64,
        ScalarType::Float32 => reader.read_f32::<B>()? as f64,
        ScalarType::Float64 => reader.read_f64::<B>()?,
    };
    Ok(value)
}

fn read_binary_record<B: ByteOrder, R: Read>(
    reader: &mut R,
    element: &ElementDef,
    values: &mut Vec<PropertyValue>,
) -> io::Result<()> {
    for property in &element.properties {
        match property.kind {
            PropertyKind::Scalar(ty) => values.push(PropertyValue::Scalar(read_scalar::<B, _>(reader, ty)?)),
            PropertyKind::List { count, item } => {
                let raw = read_scalar::<B, _>(reader, count)?;
                let len = list_len(raw).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidData, format!("invalid list length {}", raw))
                })?;
                let mut items = Vec::with_capacity(len.min(256));
                for _ in 0..len {
                    items.push(read_scalar::<B, _>(reader, item)?);
                }
                values.push(PropertyValue::List(items));
            }
        }
    }
    Ok(())
}

/// Record writer. The header is written on construction; records are then
/// put value by value and closed with [`ElementWriter::end_record`].
pub struct ElementWriter<W> {
    writer: W,
    encoding: PlyEncoding,
    precision: Option<usize>,
    record_started: bool,
}

impl<W: Write> ElementWriter<W> {
    pub fn new(mut writer: W, header: &PlyHeader, precision: Option<usize>) -> io::Result<Self> {
        header.write(&mut writer)?;
        Ok(Self {
            writer,
            encoding: header.encoding,
            precision,
            record_started: false,
        })
    }

    pub fn put(&mut self, ty: ScalarType, value: f64) -> io::Result<()> {
        match self.encoding {
            PlyEncoding::Ascii => {
                if self.record_started {
                    self.writer.write_all(b" ")?;
                }
                self.record_started = true;
                write_ascii_scalar(&mut self.writer, ty, value, self.precision)
            }
            PlyEncoding::BinaryLittleEndian => write_scalar::<LittleEndian, _>(&mut self.writer, ty, value),
            PlyEncoding::BinaryBigEndian => write_scalar::<BigEndian, _>(&mut self.writer, ty, value),
        }
    }

    pub fn put_list<I>(&mut self, count: ScalarType, item: ScalarType, items: I) -> io::Result<()>
    where
        I: ExactSizeIterator<Item = f64>,
    {
        self.put(count, items.len() as f64)?;
        for value in items {
            self.put(item, value)?;
        }
        Ok(())
    }

    pub fn end_record(&mut self) -> io::Result<()> {
        self.record_started = false;
        match self.encoding {
            PlyEncoding::Ascii => writeln!(self.writer),
            PlyEncoding::BinaryLittleEndian | PlyEncoding::BinaryBigEndian => Ok(()),
        }
    }
}

fn write_ascii_scalar<W: Write>(writer: &mut W, ty: ScalarType, value: f64, precision: Option<usize>) -> io::Result<()> {
    match (ty, precision) {
        (ScalarType::Float32, None) => write!(writer, "{}", value as f32),
        (ScalarType::Float32 | ScalarType::Float64, _) => write_real(writer, value, precision),
        _ => write!(writer, "{}", value as i64),
    }
}

fn write_scalar<B: ByteOrder, W: Write>(writer: &mut W, ty: ScalarType, value: f64) -> io::Result<()> {
    match ty {
        ScalarType::Int8 => writer.write_i8(value as i8),
        ScalarType::UInt8 => writer.write_u8(value as u8),
        ScalarType::Int16 => writer.write_i16::<B>(value as i16),
        ScalarType::UInt16 => writer.write_u16::<B>(value as u16),
        ScalarType::Int32 => writer.write_i32::<B>(value as i32),
        ScalarType::UInt32 => writer.write_u32::<B>(value as u32),
        ScalarType::Float32 => writer.write_f32::<B>(value as f32),
        ScalarType::Float64 => writer.write_f64::<B>(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "ply
format ascii 1.0
comment made by hand
obj_info scanner 7
element vertex 2
property float32 x
property double y
property uchar confidence
element face 1
property list uchar int vertex_indices
end_header
";

    fn reader(content: &str) -> Result<ElementReader<Cursor<Vec<u8>>>> {
        ElementReader::new(Cursor::new(content.as_bytes().to_vec()), "test.ply")
    }

    #[test]
    fn test_parse_header() {
        let source = reader(HEADER).unwrap();
        let header = source.header();

        assert_eq!(header.encoding, PlyEncoding::Ascii);
        assert_eq!(header.comments, vec!["made by hand".to_string()]);
        assert_eq!(header.obj_info, vec!["scanner 7".to_string()]);
        assert_eq!(header.elements.len(), 2);

        let (index, vertex) = header.element("vertex").unwrap();
        assert_eq!(index, 0);
        assert_eq!(vertex.count, 2);
        assert_eq!(vertex.properties[0].kind, PropertyKind::Scalar(ScalarType::Float32));
        assert_eq!(vertex.properties[1].kind, PropertyKind::Scalar(ScalarType::Float64));

        let (_, face) = header.element("face").unwrap();
        let (slot, indices) = face.property("vertex_indices").unwrap();
        assert_eq!(slot, 0);
        assert_eq!(
            indices.kind,
            PropertyKind::List {
                count: ScalarType::UInt8,
                item: ScalarType::Int32
            }
        );
    }

    #[test]
    fn test_read_ascii_records() {
        let content = format!("{}0.5 0.1 200\n\n1 2 3\n3 0 1 1\n", HEADER);
        let mut source = reader(&content).unwrap();
        let mut values = Vec::new();

        assert_eq!(source.next_record(&mut values).unwrap(), Some(0));
        assert_eq!(
            values,
            vec![
                PropertyValue::Scalar(0.5),
                PropertyValue::Scalar(0.1),
                PropertyValue::Scalar(200.0)
            ]
        );

        assert_eq!(source.next_record(&mut values).unwrap(), Some(0));
        assert_eq!(source.next_record(&mut values).unwrap(), Some(1));
        assert_eq!(values[0].as_list(), Some(&[0.0, 1.0, 1.0][..]));
        assert_eq!(source.next_record(&mut values).unwrap(), None);
    }

    #[test]
    fn test_ascii_record_errors_name_line() {
        let content = format!("{}0.5 0.1\n", HEADER);
        let mut source = reader(&content).unwrap();
        let err = source.next_record(&mut Vec::new()).unwrap_err();
        assert_eq!(err.line(), Some(12));
        assert!(err.to_string().contains("missing value for property 'confidence'"));

        let content = format!("{}0.5 0.1 1 9\n", HEADER);
        let mut source = reader(&content).unwrap();
        assert!(source.next_record(&mut Vec::new()).is_err());
    }

    #[test]
    fn test_header_errors() {
        assert!(matches!(reader("plx\n"), Err(MeshIoError::Format { line: 1, .. })));
        assert!(reader("ply\nformat ascii 1.0\nelement vertex 1\n").is_err());
        assert!(reader("ply\nformat utf16 1.0\nend_header\n").is_err());
        assert!(reader("ply\nformat ascii 1.0\nproperty float x\nend_header\n").is_err());
        assert!(reader("ply\nformat ascii 1.0\nelement vertex 1\nproperty half x\nend_header\n").is_err());
        assert!(reader("ply\nelement vertex 0\nend_header\n").is_err());
    }

    fn write_then_read(encoding: PlyEncoding) {
        let mut header = PlyHeader::new(encoding);
        header.comments.push("codec test".to_string());
        header.elements.push(
            ElementDef::new("point", 2)
                .with_scalar("x", ScalarType::Float32)
                .with_scalar("w", ScalarType::Int16),
        );
        header.elements.push(ElementDef::new("edge", 1).with_list(
            "ends",
            ScalarType::UInt8,
            ScalarType::UInt32,
        ));

        let mut out = Vec::new();
        let mut writer = ElementWriter::new(&mut out, &header, None).unwrap();
        writer.put(ScalarType::Float32, 1.5).unwrap();
        writer.put(ScalarType::Int16, -300.0).unwrap();
        writer.end_record().unwrap();
        writer.put(ScalarType::Float32, -0.25).unwrap();
        writer.put(ScalarType::Int16, 7.0).unwrap();
        writer.end_record().unwrap();
        writer
            .put_list(ScalarType::UInt8, ScalarType::UInt32, [0.0, 1.0].into_iter())
            .unwrap();
        writer.end_record().unwrap();

        let mut source = ElementReader::new(Cursor::new(out), "mem").unwrap();
        assert_eq!(source.header(), &header);

        let mut values = Vec::new();
        assert_eq!(source.next_record(&mut values).unwrap(), Some(0));
        assert_eq!(values, vec![PropertyValue::Scalar(1.5), PropertyValue::Scalar(-300.0)]);
        assert_eq!(source.next_record(&mut values).unwrap(), Some(0));
        assert_eq!(values[0].as_scalar(), Some(-0.25));
        assert_eq!(source.next_record(&mut values).unwrap(), Some(1));
        assert_eq!(values, vec![PropertyValue::List(vec![0.0, 1.0])]);
        assert_eq!(source.next_record(&mut values).unwrap(), None);
    }

    #[test]
    fn test_all_encodings() {
        write_then_read(PlyEncoding::Ascii);
        write_then_read(PlyEncoding::BinaryLittleEndian);
        write_then_read(PlyEncoding::BinaryBigEndian);
    }

    #[test]
    fn test_binary_truncated_record() {
        let header = "ply\nformat binary_little_endian 1.0\nelement vertex 2\nproperty float x\nend_header\n";
        let mut bytes = header.as_bytes().to_vec();
        bytes.extend_from_slice(&1.0f32.to_le_bytes());
        bytes.extend_from_slice(&[0, 0]);

        let mut source = ElementReader::new(Cursor::new(bytes), "short.ply").unwrap();
        let mut values = Vec::new();
        assert_eq!(source.next_record(&mut values).unwrap(), Some(0));
        let err = source.next_record(&mut values).unwrap_err();
        assert!(err.to_string().contains("element 'vertex' record 1: unexpected end of data"));
    }

    #[test]
    fn test_big_endian_layout() {
        let header = PlyHeader {
            encoding: PlyEncoding::BinaryBigEndian,
            elements: vec![ElementDef::new("v", 1).with_scalar("i", ScalarType::Int32)],
            ..PlyHeader::default()
        };
        let mut out = Vec::new();
        let mut writer = ElementWriter::new(&mut out, &header, None).unwrap();
        writer.put(ScalarType::Int32, 1.0).unwrap();
        assert_eq!(&out[out.len() - 4..], &[0, 0, 0, 1]);
    }
}
