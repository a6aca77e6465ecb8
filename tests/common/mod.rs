#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use md5::{Digest, Md5};
use lopdf::{Dictionary, Object, ObjectId, Stream, StringFormat, dictionary};
use std::io::Write;
use tempfile::NamedTempFile;

pub fn make_temp_file_with_suffix(contents: &[u8], suffix: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(suffix).expect("create temp file with suffix");
    file.write_all(contents).expect("write temp file contents");
    file.flush().expect("flush temp file");
    file
}

/// Builder for small text PDFs generated at test time.
#[derive(Default)]
pub struct PdfFixture {
    pages: Vec<String>,
    info: Vec<(&'static str, String)>,
    images: Vec<Stream>,
}

impl PdfFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, text: &str) -> Self {
        self.pages.push(text.to_owned());
        self
    }

    pub fn info(mut self, key: &'static str, value: &str) -> Self {
        self.info.push((key, value.to_owned()));
        self
    }

    pub fn rgb_image(mut self, width: i64, height: i64) -> Self {
        let samples = vec![128u8; (width * height * 3) as usize];
        self.images.push(image_stream("DeviceRGB", width, height, samples));
        self
    }

    /// Image XObject with caller-chosen dimensions and bit depth, for malformed input.
    pub fn raw_image(mut self, width: i64, height: i64, bits: i64, samples: Vec<u8>) -> Self {
        let mut stream = image_stream("DeviceRGB", width, height, samples);
        stream.dict.set("BitsPerComponent", bits);
        self.images.push(stream);
        self
    }

    pub fn cmyk_image(mut self) -> Self {
        self.images
            .push(image_stream("DeviceCMYK", 1, 1, vec![0, 0, 0, 255]));
        self
    }

    pub fn write(self) -> NamedTempFile {
        save(self.build())
    }

    /// Standard security handler, RC4 128-bit (V2, R3) with `user` as the user password.
    pub fn write_rc4(self, user: &str, owner: &str) -> NamedTempFile {
        let mut document = self.build();
        let file_id = b"docingest-rc4-fixture".to_vec();
        let permissions: i32 = -4;

        let owner_entry = rc4_owner_entry(owner, user);
        let key = rc4_file_key(user, &owner_entry, permissions, &file_id);
        let user_entry = rc4_user_entry(&key, &file_id);

        for (&id, object) in document.objects.iter_mut() {
            let object_key = rc4_object_key(&key, id);
            match object {
                Object::Stream(stream) => {
                    let encrypted = rc4(&object_key, &stream.content);
                    stream.set_content(encrypted);
                }
                Object::String(bytes, _) => *bytes = rc4(&object_key, bytes),
                _ => {}
            }
        }
        if let Ok(info_id) = document.trailer.get(b"Info").and_then(Object::as_reference) {
            let object_key = rc4_object_key(&key, info_id);
            if let Ok(info) = document.get_dictionary_mut(info_id) {
                for (_, value) in info.iter_mut() {
                    if let Object::String(bytes, _) = value {
                        *bytes = rc4(&object_key, bytes);
                    }
                }
            }
        }

        let encrypt_id = document.add_object(dictionary! {
            "Filter" => "Standard",
            "V" => 2,
            "R" => 3,
            "Length" => 128,
            "O" => Object::String(owner_entry, StringFormat::Hexadecimal),
            "U" => Object::String(user_entry, StringFormat::Hexadecimal),
            "P" => i64::from(permissions),
        });
        seal(&mut document, encrypt_id, file_id);
        save(document)
    }

    /// AES-128 (V4, R4) security handler, which lopdf cannot decrypt.
    pub fn write_aes(self) -> NamedTempFile {
        let mut document = self.build();
        let entry = || Object::String(vec![0x5a; 32], StringFormat::Hexadecimal);
        let encrypt_id = document.add_object(dictionary! {
            "Filter" => "Standard",
            "V" => 4,
            "R" => 4,
            "Length" => 128,
            "CF" => dictionary! {
                "StdCF" => dictionary! {
                    "CFM" => "AESV2",
                    "AuthEvent" => "DocOpen",
                    "Length" => 16,
                },
            },
            "StmF" => "StdCF",
            "StrF" => "StdCF",
            "O" => entry(),
            "U" => entry(),
            "P" => -4,
        });
        seal(&mut document, encrypt_id, b"docingest-aes-fixture".to_vec());
        save(document)
    }

    fn build(self) -> lopdf::Document {
        let mut document = lopdf::Document::with_version("1.5");
        let pages_id = document.new_object_id();

        let font_id = document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let mut xobjects = Dictionary::new();
        for (position, image) in self.images.into_iter().enumerate() {
            let image_id = document.add_object(image);
            xobjects.set(format!("Im{}", position + 1), image_id);
        }
        let resources_id = document.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
            "XObject" => xobjects,
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in &self.pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(text.as_str())]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = document.add_object(Stream::new(
                Dictionary::new(),
                content.encode().expect("encode page content"),
            ));
            let page_id = document.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
            }),
        );
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        if !self.info.is_empty() {
            let mut info = Dictionary::new();
            for (key, value) in self.info {
                info.set(key, Object::string_literal(value));
            }
            let info_id = document.add_object(info);
            document.trailer.set("Info", info_id);
        }

        document.compress();
        document
    }
}

fn save(mut document: lopdf::Document) -> NamedTempFile {
    let file = NamedTempFile::with_suffix(".pdf").expect("create pdf temp file");
    document.save(file.path()).expect("write fixture pdf");
    file
}

fn seal(document: &mut lopdf::Document, encrypt_id: ObjectId, file_id: Vec<u8>) {
    document.trailer.set("Encrypt", encrypt_id);
    document.trailer.set(
        "ID",
        vec![
            Object::String(file_id.clone(), StringFormat::Hexadecimal),
            Object::String(file_id, StringFormat::Hexadecimal),
        ],
    );
}

const PASSWORD_PAD: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

fn padded(password: &str) -> Vec<u8> {
    let bytes = password.as_bytes();
    let used = bytes.len().min(32);
    let mut out = bytes[..used].to_vec();
    out.extend_from_slice(&PASSWORD_PAD[..32 - used]);
    out
}

fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut state: Vec<u8> = (0..=255).collect();
    let mut j = 0u8;
    for i in 0..256 {
        j = j.wrapping_add(state[i]).wrapping_add(key[i % key.len()]);
        state.swap(i, usize::from(j));
    }

    let (mut i, mut j) = (0u8, 0u8);
    data.iter()
        .map(|byte| {
            i = i.wrapping_add(1);
            j = j.wrapping_add(state[usize::from(i)]);
            state.swap(usize::from(i), usize::from(j));
            let index = state[usize::from(i)].wrapping_add(state[usize::from(j)]);
            byte ^ state[usize::from(index)]
        })
        .collect()
}

/// Nineteen extra RC4 passes with the key XORed by the pass number (revision 3).
fn rc4_rounds(key: &[u8], mut data: Vec<u8>) -> Vec<u8> {
    for round in 1..=19u8 {
        let round_key: Vec<u8> = key.iter().map(|byte| byte ^ round).collect();
        data = rc4(&round_key, &data);
    }
    data
}

fn md5_of(data: impl AsRef<[u8]>) -> [u8; 16] {
    Md5::digest(data).into()
}

fn md5_rehash(mut digest: [u8; 16]) -> [u8; 16] {
    for _ in 0..50 {
        digest = md5_of(digest);
    }
    digest
}

fn rc4_owner_entry(owner: &str, user: &str) -> Vec<u8> {
    let key = md5_rehash(md5_of(padded(owner)));
    rc4_rounds(&key, rc4(&key, &padded(user)))
}

fn rc4_file_key(user: &str, owner_entry: &[u8], permissions: i32, file_id: &[u8]) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(padded(user));
    hasher.update(owner_entry);
    hasher.update((permissions as u32).to_le_bytes());
    hasher.update(file_id);
    md5_rehash(hasher.finalize().into())
}

fn rc4_user_entry(key: &[u8], file_id: &[u8]) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(PASSWORD_PAD);
    hasher.update(file_id);
    let digest: [u8; 16] = hasher.finalize().into();
    let mut entry = rc4_rounds(key, rc4(key, &digest));
    entry.extend_from_slice(&PASSWORD_PAD[..16]);
    entry
}

fn rc4_object_key(key: &[u8], id: ObjectId) -> Vec<u8> {
    let mut material = key.to_vec();
    material.extend_from_slice(&id.0.to_le_bytes()[..3]);
    material.extend_from_slice(&id.1.to_le_bytes()[..2]);
    md5_of(material).to_vec()
}

fn image_stream(colour_space: &str, width: i64, height: i64, samples: Vec<u8>) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => colour_space,
            "BitsPerComponent" => 8,
        },
        samples,
    )
}
