//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Parser HTTP/1.0 escrito desde cero.
//!
//! ## Formato de un Request
//!
//! ```text
//! POST /hash HTTP/1.0\r\n
//! Content-Type: application/x-www-form-urlencoded\r\n
//! Content-Length: 20\r\n
//! \r\n
//! password=angryMonkey
//! ```
//!
//! 1. **Request Line**: `METHOD /path?query HTTP/1.0`
//! 2. **Headers**: Pares `Name: Value` (uno por línea)
//! 3. **Empty Line**: `\r\n` que separa headers del body
//! 4. **Body**: bytes crudos (formularios urlencoded en POST)

use std::collections::HashMap;
use thiserror::Error;

/// Separador entre headers y body
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
    PATCH,
}

impl Method {
    /// Parsea un método HTTP desde un string
    fn from_str(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "DELETE" => Ok(Method::DELETE),
            "PATCH" => Ok(Method::PATCH),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::PATCH => "PATCH",
        }
    }
}

/// Representa un request HTTP/1.0 parseado
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,

    /// Path sin query string (ej: "/hash/1")
    path: String,

    query_params: HashMap<String, String>,

    /// Headers tal cual llegaron; la búsqueda ignora mayúsculas
    headers: HashMap<String, String>,

    version: String,

    body: Vec<u8>,
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid request line format")]
    InvalidRequestLine,

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Empty request")]
    EmptyRequest,
}

impl Request {
    /// Parsea un request HTTP/1.0 desde bytes
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use hash_server::http::Request;
    ///
    /// let raw = b"GET /hash/42 HTTP/1.0\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/hash/42");
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        // Sin terminador todo el buffer se considera cabecera
        let (head, body) = match find_header_end(buffer) {
            Some(end) => (&buffer[..end], &buffer[end + HEADER_TERMINATOR.len()..]),
            None => (buffer, &[][..]),
        };

        let head = std::str::from_utf8(head).map_err(|_| ParseError::InvalidRequestLine)?;

        if head.trim().is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        let mut lines = head.split("\r\n");
        let request_line = lines.next().ok_or(ParseError::EmptyRequest)?;

        let (method, path, query_params, version) = Self::parse_request_line(request_line)?;
        let headers = Self::parse_headers(lines)?;

        Ok(Request {
            method,
            path,
            query_params,
            headers,
            version,
            body: body.to_vec(),
        })
    }

    /// Calcula cuántos bytes ocupa el request completo
    ///
    /// Retorna `None` mientras los headers no hayan llegado completos. Con los
    /// headers disponibles suma el `Content-Length` declarado (0 si no existe).
    pub fn expected_len(buffer: &[u8]) -> Option<usize> {
        let end = find_header_end(buffer)?;
        let head = String::from_utf8_lossy(&buffer[..end]);

        let content_length = head
            .split("\r\n")
            .skip(1)
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("Content-Length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        Some(end + HEADER_TERMINATOR.len() + content_length)
    }

    /// Formato: `GET /path?query HTTP/1.0`
    fn parse_request_line(
        line: &str,
    ) -> Result<(Method, String, HashMap<String, String>, String), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::from_str(parts[0])?;
        let (path, query_params) = Self::parse_path_and_query(parts[1]);

        let version = parts[2].to_string();
        if version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(ParseError::InvalidHttpVersion(version));
        }

        Ok((method, path, query_params, version))
    }

    fn parse_path_and_query(path_with_query: &str) -> (String, HashMap<String, String>) {
        match path_with_query.split_once('?') {
            Some((path, query)) => (path.to_string(), parse_urlencoded(query.as_bytes())),
            None => (path_with_query.to_string(), HashMap::new()),
        }
    }

    fn parse_headers<'a>(
        lines: impl Iterator<Item = &'a str>,
    ) -> Result<HashMap<String, String>, ParseError> {
        let mut headers = HashMap::new();

        for line in lines {
            if line.trim().is_empty() {
                break;
            }

            match line.split_once(':') {
                Some((name, value)) => {
                    headers.insert(name.trim().to_string(), value.trim().to_string());
                }
                None => return Err(ParseError::InvalidHeader(line.to_string())),
            }
        }

        Ok(headers)
    }

    // === Accesores ===

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Obtiene un query parameter específico
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(|s| s.as_str())
    }

    /// Obtiene un header sin distinguir mayúsculas/minúsculas
    ///
    /// # Ejemplo
    /// ```
    /// use hash_server::http::Request;
    ///
    /// let raw = b"GET / HTTP/1.0\r\ncontent-type: text/plain\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.header("Content-Type"), Some("text/plain"));
    /// ```
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Lee un campo del formulario del body
    ///
    /// Se aceptan bodies `application/x-www-form-urlencoded` y
    /// `multipart/form-data` (solo campos sin `filename`). Sin `Content-Type`,
    /// o con cualquier otro, el formulario se considera vacío.
    ///
    /// # Ejemplo
    /// ```
    /// use hash_server::http::Request;
    ///
    /// let raw = b"POST /hash HTTP/1.0\r\n\
    ///     Content-Type: application/x-www-form-urlencoded\r\n\
    ///     Content-Length: 20\r\n\r\npassword=angryMonkey";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.form_value("password").as_deref(), Some("angryMonkey"));
    /// ```
    pub fn form_value(&self, name: &str) -> Option<String> {
        let content_type = self.header("Content-Type")?;
        let (media_type, params) = match content_type.split_once(';') {
            Some((media_type, params)) => (media_type.trim(), params),
            None => (content_type.trim(), ""),
        };

        if media_type.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            parse_urlencoded(&self.body).remove(name)
        } else if media_type.eq_ignore_ascii_case("multipart/form-data") {
            let boundary = header_param(params, "boundary")?;
            multipart_field(&self.body, &boundary, name)
        } else {
            None
        }
    }
}

/// Busca `key=value` en los parámetros de un header (`; a=1; b="dos"`)
fn header_param(params: &str, key: &str) -> Option<String> {
    params
        .split(';')
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case(key))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Extrae el primer campo `name` de un body `multipart/form-data`
///
/// ```text
/// --boundary\r\n
/// Content-Disposition: form-data; name="password"\r\n
/// \r\n
/// angryMonkey\r\n
/// --boundary--\r\n
/// ```
fn multipart_field(body: &[u8], boundary: &str, name: &str) -> Option<String> {
    let delimiter = format!("--{}", boundary).into_bytes();

    let field = split_on(body, &delimiter)
        .skip(1)
        .take_while(|part| !part.starts_with(b"--"))
        .find_map(|part| {
            let part = part.strip_prefix(b"\r\n").unwrap_or(part);
            let end = find_header_end(part)?;
            let head = String::from_utf8_lossy(&part[..end]);

            let disposition = head
                .split("\r\n")
                .filter_map(|line| line.split_once(':'))
                .find(|(key, _)| key.trim().eq_ignore_ascii_case("Content-Disposition"))
                .map(|(_, value)| value)?;

            let is_field = header_param(disposition, "name").as_deref() == Some(name)
                && header_param(disposition, "filename").is_none();
            if !is_field {
                return None;
            }

            let value = &part[end + HEADER_TERMINATOR.len()..];
            let value = value.strip_suffix(b"\r\n").unwrap_or(value);
            Some(String::from_utf8_lossy(value).into_owned())
        });
    field
}

/// Divide `input` en los tramos entre apariciones de `delimiter`
fn split_on<'a>(input: &'a [u8], delimiter: &'a [u8]) -> impl Iterator<Item = &'a [u8]> + 'a {
    let mut rest = Some(input);

    std::iter::from_fn(move || {
        let current = rest?;
        match current
            .windows(delimiter.len())
            .position(|window| window == delimiter)
        {
            Some(pos) => {
                rest = Some(&current[pos + delimiter.len()..]);
                Some(&current[..pos])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

/// Parsea `a=1&b=dos` en un HashMap
///
/// Los pares sin `=` quedan con valor vacío. Si una clave se repite, gana la
/// primera aparición.
fn parse_urlencoded(input: &[u8]) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for pair in input.split(|&b| b == b'&') {
        if pair.is_empty() {
            continue;
        }

        let (key, value) = match pair.iter().position(|&b| b == b'=') {
            Some(eq) => (&pair[..eq], &pair[eq + 1..]),
            None => (pair, &[][..]),
        };

        params
            .entry(url_decode(key))
            .or_insert_with(|| url_decode(value));
    }

    params
}

/// Decodifica `%XX` y `+`; las secuencias `%` inválidas se copian tal cual
fn url_decode(input: &[u8]) -> String {
    let mut decoded = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        match input[i] {
            b'+' => decoded.push(b' '),
            b'%' if i + 2 < input.len() => {
                match (hex_value(input[i + 1]), hex_value(input[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        decoded.push(hi << 4 | lo);
                        i += 2;
                    }
                    _ => decoded.push(b'%'),
                }
            }
            byte => decoded.push(byte),
        }
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
