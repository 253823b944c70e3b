use cppfier::{generate, harness, Generation, Input, Opt, Severity};
use indoc::indoc;

fn opt(namespace: Option<&str>, prefixes: &[&str]) -> Opt {
    let mut opt = Opt::default();
    opt.namespace = namespace.map(str::to_owned);
    opt.prefixes = prefixes.iter().map(|&prefix| prefix.to_owned()).collect();
    opt.ignore_tokens = vec!["SDL_DECLSPEC".to_owned(), "SDLCALL".to_owned()];
    opt
}

fn generate_one(name: &str, source: &str, opt: &Opt) -> Generation {
    let output = cppfier::default_output_name(name, &opt.prefixes);
    generate(&[Input::new(name, output, source)], opt)
}

const ENUMS: &str = indoc! {"
    enum MyEnum
    {
      MyENUM_VALUE0,
      MyENUM_VALUE1 = 123,
      MyENUM_VALUE_N = 9999
    };
"};

#[test]
fn test_enum_constants_keep_order_and_values() {
    let generation = generate_one("enums.h", ENUMS, &opt(Some("name"), &["My"]));
    assert!(generation.is_clean());
    let file = &generation.files[0];
    let constants: Vec<_> = file
        .constants
        .iter()
        .map(|konst| (konst.name.as_str(), konst.value))
        .collect();
    assert_eq!(
        constants,
        [
            ("ENUM_VALUE0", Some(0)),
            ("ENUM_VALUE1", Some(123)),
            ("ENUM_VALUE_N", Some(9999)),
        ],
    );
    assert!(file.content.contains("using Enum = MyEnum;"));
    assert!(file
        .content
        .contains("constexpr Enum ENUM_VALUE1 = MyENUM_VALUE1;"));
}

#[test]
fn test_reordered_enumerators_reorder_constants() {
    let source = indoc! {"
        enum MyEnum
        {
          MyENUM_VALUE_N = 9999,
          MyENUM_VALUE0 = 0,
          MyENUM_VALUE1 = 123
        };
    "};
    let generation = generate_one("enums.h", source, &opt(Some("name"), &["My"]));
    let names: Vec<_> = generation.files[0]
        .constants
        .iter()
        .map(|konst| konst.name.as_str())
        .collect();
    assert_eq!(names, ["ENUM_VALUE_N", "ENUM_VALUE0", "ENUM_VALUE1"]);
}

#[test]
fn test_aliased_enum_reuses_base_values() {
    let alias = "typedef MyEnum MyOtherEnum;\n";
    let opt = opt(Some("name"), &["My"]);
    let generation = generate(
        &[
            Input::new("enums.h", "enums.hpp", ENUMS),
            Input::new("aliased_enums.h", "aliased_enums.hpp", alias),
        ],
        &opt,
    );
    assert!(generation.is_clean());
    let base = &generation.files[0].constants;
    let aliased = &generation.files[1].constants;
    assert_eq!(aliased.len(), base.len());
    for (aliased, base) in aliased.iter().zip(base) {
        assert_eq!(aliased.source, base.source);
        assert_eq!(aliased.value, base.value);
        assert_ne!(aliased.name, base.name);
    }
    assert_eq!(aliased[0].name, "OTHER_ENUM_VALUE0");
    assert!(generation.files[1]
        .content
        .contains("constexpr OtherEnum OTHER_ENUM_VALUE_N = MyENUM_VALUE_N;"));
}

#[test]
fn test_alias_constant_points_at_enumerator() {
    let source = indoc! {"
        enum MyEnum
        {
          MyENUM_VALUE0,
          MyENUM_VALUE1 = 123
        };
        using Enum = MyEnum;
        constexpr Enum ENUM_VALUE0 = MyENUM_VALUE0;
        constexpr Enum ENUM_VALUE1 = MyENUM_VALUE1;
    "};
    let generation = generate_one("enums.h", source, &opt(Some("name"), &[]));
    assert!(generation.is_clean());
    let file = &generation.files[0];
    let grouped: Vec<_> = file
        .constants
        .iter()
        .filter(|konst| konst.name.starts_with("ENUM_"))
        .map(|konst| (konst.name.as_str(), konst.value))
        .collect();
    assert_eq!(grouped, [("ENUM_VALUE0", Some(0)), ("ENUM_VALUE1", Some(123))]);
    assert!(file
        .content
        .contains("using Enum = ::Enum;\n\nconstexpr Enum ENUM_VALUE0 = ::ENUM_VALUE0;\n"));
}

#[test]
fn test_overloads_keep_their_parameters() {
    let source = indoc! {"
        int funcInt(int value, int otherValue = 0);
        int funcInt(int value);
    "};
    let generation = generate_one("functions.h", source, &opt(Some("name"), &[]));
    assert!(generation.is_clean());
    let content = &generation.files[0].content;
    assert!(content.contains(indoc! {"
        inline int funcInt(int value, int otherValue = 0)
        {
          return ::funcInt(value, otherValue);
        }
    "}));
    assert!(content.contains(indoc! {"
        inline int funcInt(int value)
        {
          return ::funcInt(value);
        }
    "}));
    assert_eq!(generation.files[0].decls, ["funcInt", "funcInt"]);
}

#[test]
fn test_generation_is_idempotent() {
    let source = include_str!("samples/resources.h");
    let opt = opt(Some("name"), &["My", "SDL_"]);
    let first = generate_one("resources.h", source, &opt);
    let second = generate_one("resources.h", source, &opt);
    assert_eq!(first.files[0].content, second.files[0].content);
}

#[test]
fn test_malformed_declaration_is_isolated() {
    let source = indoc! {"
        int SDL_Before(int a);
        int SDL_Broken(int a, ;
        int SDL_After(int b);
    "};
    let generation = generate_one("SDL_isolated.h", source, &opt(Some("SDL"), &["SDL_"]));
    assert!(generation.has_errors());
    assert_eq!(generation.reports.len(), 1);
    assert_eq!(generation.reports[0].name, "SDL_isolated.h");
    assert_eq!(generation.reports[0].diagnostics.len(), 1);
    let file = &generation.files[0];
    assert_eq!(file.path, "isolated.hpp");
    assert_eq!(file.decls, ["SDL_Before", "SDL_After"]);
    assert!(file.content.contains("inline int Before(int a)"));
    assert!(file.content.contains("inline int After(int b)"));
    assert!(!file.content.contains("Broken"));
}

const WINDOW: &str = indoc! {"
    typedef struct SDL_Window SDL_Window;
    extern SDL_DECLSPEC SDL_Window * SDLCALL SDL_CreateWindow(const char *title, int w, int h);
    extern SDL_DECLSPEC SDL_Window * SDLCALL SDL_CreatePopupWindow(SDL_Window *parent, int w, int h);
    extern SDL_DECLSPEC const SDL_Window * SDLCALL SDL_CreateWindowView(int id);
    extern SDL_DECLSPEC const char * SDLCALL SDL_GetWindowTitle(const SDL_Window *window);
    extern SDL_DECLSPEC void SDLCALL SDL_DestroyWindow(SDL_Window *window);
"};

#[test]
fn test_resource_triad_emitted_once() {
    let generation = generate_one("SDL_video.h", WINDOW, &opt(Some("SDL"), &["SDL_"]));
    assert!(generation.is_clean());
    let content = &generation.files[0].content;
    for needle in [
        "using WindowRaw = SDL_Window*;",
        "struct WindowParam\n",
        "class Window\n",
        "struct WindowRef : Window\n",
    ] {
        assert_eq!(content.matches(needle).count(), 1, "{}", needle);
    }
    assert!(content.contains("  ~Window() { SDL_DestroyWindow(m_resource); }"));
    assert!(content.contains("  ~WindowRef() { release(); }"));
    assert!(content.contains("  constexpr Window(const Window& other) = delete;"));
    assert!(content.contains("    : m_resource(SDL_CreatePopupWindow(parent, w, h))"));
    assert!(content.contains("  const char* GetTitle() const;"));
    assert!(content.contains("inline void Window::Destroy() { SDL::DestroyWindow(release()); }"));
    assert!(content.starts_with("// Generated by cppfier from SDL_video.h. Do not edit.\n"));
    assert!(content.contains("#include <compare>\n#include <cstddef>\n#include <utility>\n"));
}

#[test]
fn test_constructor_needs_bare_pointer_return() {
    let generation = generate_one("SDL_video.h", WINDOW, &opt(Some("SDL"), &["SDL_"]));
    let content = &generation.files[0].content;
    assert!(content.contains(indoc! {"
        inline const SDL_Window* CreateWindowView(int id)
        {
          return SDL_CreateWindowView(id);
        }
    "}));
    assert!(!content.contains("Window(int id)"));
}

#[test]
fn test_unsupported_shape_is_loud() {
    let source = indoc! {"
        void SDL_Log(const char *fmt, ...);
        int SDL_GetVersion(void);
    "};
    let generation = generate_one("SDL_log.h", source, &opt(Some("SDL"), &["SDL_"]));
    assert!(generation.has_errors());
    let errors: Vec<_> = generation
        .diagnostics()
        .filter(|diagnostic| diagnostic.severity == Severity::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("SDL_Log"));
    let content = &generation.files[0].content;
    assert!(content.contains(indoc! {r#"
        // variadic function: not implemented
        template<class... ARGS>
        inline void Log(ARGS... args)
        {
          static_assert(false, "Not implemented");
        }
    "#}));
    assert!(content.contains("inline int GetVersion()"));
}

#[test]
fn test_global_scope_skips_unprefixed_names() {
    let source = indoc! {"
        int SDL_GetVersion(void);
        int helper(int x);
    "};
    let generation = generate_one("SDL_version.h", source, &opt(None, &["SDL_"]));
    assert!(!generation.has_errors());
    assert!(generation.has_warnings());
    let content = &generation.files[0].content;
    assert!(!content.contains("namespace"));
    assert!(content.contains("inline int GetVersion()"));
    assert!(!content.contains("helper"));
}

#[test]
fn test_mismatch_names_first_declaration() {
    let source = indoc! {"
        int funcInt(int value, int otherValue = 0);
        int funcInt(int value);
        void funcVoid(void);
    "};
    let generation = generate_one("functions.h", source, &opt(Some("name"), &[]));
    let actual = &generation.files[0].content;
    let expected = actual.replace("otherValue = 0", "otherValue = 1");
    let mismatch = harness::compare(&expected, actual).unwrap_err();
    assert_eq!(mismatch.name, "name::funcInt");
    assert!(mismatch.expected.unwrap().contains("otherValue = 1"));

    let reformatted = actual.replace("\n{\n  ", " { ").replace("// Generated", "// Made");
    harness::compare(&reformatted, actual).unwrap();
}

#[test]
fn test_unmatched_declarations_forward_with_warning() {
    let source = indoc! {"
        extern int SDL_counter;
        #define SDL_ALIAS SDL_SOMETHING_ELSE
    "};
    let generation = generate_one("SDL_misc.h", source, &opt(Some("SDL"), &["SDL_"]));
    assert!(!generation.has_errors());
    let warnings: Vec<_> = generation
        .diagnostics()
        .map(|diagnostic| diagnostic.message.as_str())
        .collect();
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().any(|message| message.contains("SDL_counter")));
    assert!(warnings.iter().any(|message| message.contains("SDL_ALIAS")));
    let content = &generation.files[0].content;
    assert!(content.contains("inline auto& counter() { return SDL_counter; }"));
    assert!(content.contains("constexpr auto ALIAS = SDL_ALIAS;"));
}

#[test]
fn test_escaped_multibyte_char_keeps_parsing() {
    let source = "#define SDL_TEXT \"\\\u{e9}\"\nint SDL_After(void);\n";
    let generation = generate_one("SDL_text.h", source, &opt(Some("SDL"), &["SDL_"]));
    assert!(!generation.has_errors());
    let file = &generation.files[0];
    assert!(file.decls.iter().any(|decl| decl == "SDL_After"));
    assert!(file.content.contains("inline int After()"));
}

#[test]
fn test_constructor_of_one_resource_is_not_a_method_of_another() {
    let source = indoc! {"
        typedef struct SDL_Window SDL_Window;
        typedef struct SDL_Renderer SDL_Renderer;
        SDL_Window *SDL_CreateWindow(const char *title, int w, int h);
        void SDL_DestroyWindow(SDL_Window *window);
        SDL_Renderer *SDL_CreateRenderer(SDL_Window *window, int flags);
        void SDL_DestroyRenderer(SDL_Renderer *renderer);
    "};
    let generation = generate_one("SDL_render.h", source, &opt(Some("SDL"), &["SDL_"]));
    assert!(generation.is_clean());
    let content = &generation.files[0].content;
    assert!(content.contains("  Renderer(WindowParam window, int flags)\n    : m_resource(SDL_CreateRenderer(window, flags))"));
    assert!(content.contains("  ~Renderer() { SDL_DestroyRenderer(m_resource); }"));
    assert!(content.contains(indoc! {"
        inline Renderer CreateRenderer(WindowParam window, int flags)
        {
          return Renderer(window, flags);
        }
    "}));
    assert!(!content.contains("Window::CreateRenderer"));
    assert!(!content.contains("RendererRef CreateRenderer"));
}

#[test]
fn test_resource_split_across_files() {
    let types = indoc! {"
        typedef struct SDL_Cursor SDL_Cursor;
        void SDL_SetCursor(SDL_Cursor *cursor);
    "};
    let mouse = indoc! {"
        SDL_Cursor *SDL_CreateCursor(int id);
        void SDL_DestroyCursor(SDL_Cursor *cursor);
    "};
    let generation = generate(
        &[
            Input::new("SDL_cursor.h", "cursor.hpp", types),
            Input::new("SDL_mouse.h", "mouse.hpp", mouse),
        ],
        &opt(Some("SDL"), &["SDL_"]),
    );
    assert!(generation.is_clean());

    let declaring = &generation.files[0].content;
    assert!(!declaring.contains("using CursorRaw"));
    assert!(declaring.contains("#include \"mouse.hpp\"\n"));
    assert!(declaring.contains("inline void SetCursor(CursorParam cursor)"));

    let home = &generation.files[1];
    assert_eq!(home.decls, ["SDL_Cursor", "SDL_CreateCursor", "SDL_DestroyCursor"]);
    assert_eq!(home.content.matches("class Cursor\n").count(), 1);
    assert!(home.content.contains("using CursorRaw = SDL_Cursor*;"));
    assert!(home.content.contains("    : m_resource(SDL_CreateCursor(id))"));
    assert!(home.content.contains("  ~Cursor() { SDL_DestroyCursor(m_resource); }"));
    assert!(home.content.contains("#include <compare>\n"));
}
