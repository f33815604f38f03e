use crate::model::{LangIdRef, LangNameRef};

/// Languages accepted by the submit form, as `(name, programTypeId)`.
pub static LANGUAGES: &[(&str, &str)] = &[
    ("Microsoft Visual C++ 2010", "2"),
    ("Delphi 7", "3"),
    ("Free Pascal 3.0.2", "4"),
    ("PHP 7.2.13", "6"),
    ("Python 2.7.18", "7"),
    ("C# Mono 6.8", "9"),
    ("Haskell GHC 8.10.1", "12"),
    ("Perl 5.20.1", "13"),
    ("ActiveTcl 8.5", "14"),
    ("Io-2008-01-07 (Win32)", "15"),
    ("Pike 7.8", "17"),
    ("Befunge", "18"),
    ("OCaml 4.02.1", "19"),
    ("Scala 2.12.8", "20"),
    ("OpenCobol 1.0", "22"),
    ("Factor", "25"),
    ("Secret_171", "26"),
    ("Roco", "27"),
    ("D DMD32 v2.091.0", "28"),
    ("Python 3.9.1", "31"),
    ("Go 1.15.6", "32"),
    ("Ada GNAT 4", "33"),
    ("JavaScript V8 4.8.0", "34"),
    ("Java 1.8.0_241", "36"),
    ("Mysterious Language", "38"),
    ("FALSE", "39"),
    ("PyPy 2.7 (7.3.0)", "40"),
    ("PyPy 3.7 (7.3.0)", "41"),
    ("GNU G++11 5.1.0", "42"),
    ("GNU GCC C11 5.1.0", "43"),
    ("Picat 0.9", "44"),
    ("GNU C++11 5 ZIP", "45"),
    ("Java 8 ZIP", "46"),
    ("J", "47"),
    ("Kotlin 1.4.0", "48"),
    ("Rust 1.49.0", "49"),
    ("GNU G++14 6.4.0", "50"),
    ("PascalABC.NET 3.4.2", "51"),
    ("Clang++17 Diagnostics", "52"),
    ("GNU G++17 7.3.0", "54"),
    ("Node.js 12.6.3", "55"),
    ("Microsoft Q#", "56"),
    ("Text", "57"),
    ("Microsoft Visual C++ 2017", "59"),
    ("Java 11.0.6", "60"),
    ("GNU G++17 9.2.0 (64 bit, msys 2)", "61"),
    ("UnknownX", "62"),
    ("C# 8, .NET Core 3.1", "65"),
    ("Ruby 3.0.0", "67"),
    ("Secret 2021", "68"),
];

/// Language picked for a source file when none is given.
static DEFAULT_FOR_EXT: &[(&str, &str)] = &[
    ("c", "GNU GCC C11 5.1.0"),
    ("cc", "GNU G++17 7.3.0"),
    ("cpp", "GNU G++17 7.3.0"),
    ("cs", "C# 8, .NET Core 3.1"),
    ("d", "D DMD32 v2.091.0"),
    ("go", "Go 1.15.6"),
    ("hs", "Haskell GHC 8.10.1"),
    ("java", "Java 11.0.6"),
    ("js", "Node.js 12.6.3"),
    ("kt", "Kotlin 1.4.0"),
    ("ml", "OCaml 4.02.1"),
    ("pas", "Free Pascal 3.0.2"),
    ("php", "PHP 7.2.13"),
    ("pl", "Perl 5.20.1"),
    ("py", "Python 3.9.1"),
    ("rb", "Ruby 3.0.0"),
    ("rs", "Rust 1.49.0"),
    ("scala", "Scala 2.12.8"),
    ("txt", "Text"),
];

pub fn lang_id(lang_name: LangNameRef) -> Option<LangIdRef<'static>> {
    LANGUAGES
        .iter()
        .find(|(name, _)| *name == lang_name)
        .map(|(_, id)| *id)
}

pub fn lang_name_for_ext(ext: &str) -> Option<LangNameRef<'static>> {
    let ext = ext.trim_start_matches('.').to_lowercase();
    DEFAULT_FOR_EXT
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, name)| *name)
}
