/// Iterator over SMBIOS text strings.
/// Returns a byte slice without null terminator.
///
/// Stops at the first empty string (the double-null terminator) or at the
/// end of the slice. A trailing string missing its terminator is returned
/// as-is, since the slice may have been cut short by a truncated table.
pub struct TextIterator<'a> {
    pub slice: &'a [u8],
}

impl<'a> TextIterator<'a> {
    pub fn new(slice: &'a [u8]) -> Self {
        Self { slice }
    }
}

impl<'a> Iterator for TextIterator<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let (text, rest) = match self.slice.iter().position(|&x| x == 0) {
            Some(n) => (&self.slice[..n], &self.slice[n + 1..]),
            None => (self.slice, &[][..]),
        };

        if text.is_empty() {
            self.slice = &[];
            return None;
        }

        self.slice = rest;
        return Some(text);
    }
}

impl core::iter::FusedIterator for TextIterator<'_> {}
