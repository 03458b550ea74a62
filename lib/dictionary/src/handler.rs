use crate::code::CodedQuad;
use crate::dictionary::TermDictionary;
use rdf_pipe_common::error::DictionaryError;
use rdf_pipe_model::{Quad, QuadRef};

/// Receives a stream of quads, e.g., from a parser.
///
/// [start](Self::start) is called once before the first quad and [end](Self::end) once after the
/// last one. An error aborts the stream.
pub trait QuadHandler {
    type Error;

    fn start(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn handle(&mut self, quad: QuadRef<'_>) -> Result<(), Self::Error>;

    fn end(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Receives a stream of [coded quads](CodedQuad). The counterpart of [QuadHandler].
pub trait CodedQuadHandler {
    type Error;

    fn start(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn handle(&mut self, quad: CodedQuad) -> Result<(), Self::Error>;

    fn end(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Encodes every quad it receives and forwards the result to the inner handler.
#[derive(Debug)]
pub struct EncodingHandler<'d, H> {
    dictionary: &'d TermDictionary,
    inner: H,
}

impl<'d, H> EncodingHandler<'d, H> {
    pub fn new(dictionary: &'d TermDictionary, inner: H) -> Self {
        Self { dictionary, inner }
    }

    pub fn into_inner(self) -> H {
        self.inner
    }
}

impl<H> QuadHandler for EncodingHandler<'_, H>
where
    H: CodedQuadHandler,
    H::Error: From<DictionaryError>,
{
    type Error = H::Error;

    fn start(&mut self) -> Result<(), Self::Error> {
        self.inner.start()
    }

    fn handle(&mut self, quad: QuadRef<'_>) -> Result<(), Self::Error> {
        let quad = self.dictionary.encode_quad(quad)?;
        self.inner.handle(quad)
    }

    fn end(&mut self) -> Result<(), Self::Error> {
        self.inner.end()
    }
}

/// Decodes every coded quad it receives and forwards the result to the inner handler.
#[derive(Debug)]
pub struct DecodingHandler<'d, H> {
    dictionary: &'d TermDictionary,
    inner: H,
}

impl<'d, H> DecodingHandler<'d, H> {
    pub fn new(dictionary: &'d TermDictionary, inner: H) -> Self {
        Self { dictionary, inner }
    }

    pub fn into_inner(self) -> H {
        self.inner
    }
}

impl<H> CodedQuadHandler for DecodingHandler<'_, H>
where
    H: QuadHandler,
    H::Error: From<DictionaryError>,
{
    type Error = H::Error;

    fn start(&mut self) -> Result<(), Self::Error> {
        self.inner.start()
    }

    fn handle(&mut self, quad: CodedQuad) -> Result<(), Self::Error> {
        let quad = self.dictionary.decode_quad(quad)?;
        self.inner.handle(quad.as_ref())
    }

    fn end(&mut self) -> Result<(), Self::Error> {
        self.inner.end()
    }
}

impl QuadHandler for Vec<Quad> {
    type Error = DictionaryError;

    fn handle(&mut self, quad: QuadRef<'_>) -> Result<(), Self::Error> {
        self.push(quad.into_owned());
        Ok(())
    }
}

impl CodedQuadHandler for Vec<CodedQuad> {
    type Error = DictionaryError;

    fn handle(&mut self, quad: CodedQuad) -> Result<(), Self::Error> {
        self.push(quad);
        Ok(())
    }
}
