#[macro_export]
macro_rules! do_internal(
    ($func:ident) => {
        $crate::binding::KeyBinding::Act(Box::new(
            |model: &mut $crate::model::Model<'_>| {
                model.$func();
            },
        ))
    };

    ($func:ident, $($arg:expr),+) => {
        $crate::binding::KeyBinding::Act(Box::new(
            move |model: &mut $crate::model::Model<'_>| {
                model.$func($($arg),+);
            },
        ))
    };
);

#[macro_export]
macro_rules! do_internal_block(
    ($model:ident, $body:block) => {
        $crate::binding::KeyBinding::Act(Box::new(
            |$model: &mut $crate::model::Model<'_>| {
                $body
            },
        ))
    };
);

#[macro_export]
macro_rules! do_internal_mouse(
    ($func:ident) => {
        Box::new(|model: &mut $crate::model::Model<'_>, _| {
            model.$func();
        }) as $crate::binding::MouseAction
    };

    ($func:ident, $($arg:expr),+) => {
        Box::new(|model: &mut $crate::model::Model<'_>, _| {
            model.$func($($arg),+);
        }) as $crate::binding::MouseAction
    };
);

#[macro_export]
macro_rules! do_internal_mouse_block(
    ($model:ident, $window:ident, $body:block) => {
        Box::new(
            |$model: &mut $crate::model::Model<'_>,
             $window: Option<winsys::window::Window>| {
                $body
            },
        ) as $crate::binding::MouseAction
    };
);

#[macro_export]
macro_rules! spawn_external(
    ($cmd:expr) => {
        $crate::binding::KeyBinding::Act(Box::new(
            move |_: &mut $crate::model::Model<'_>| {
                $crate::util::Util::spawn($cmd);
            },
        ))
    };
);

#[macro_export]
macro_rules! spawn_from_shell(
    ($cmd:expr) => {
        $crate::binding::KeyBinding::Act(Box::new(
            move |_: &mut $crate::model::Model<'_>| {
                $crate::util::Util::spawn_shell($cmd);
            },
        ))
    };
);

#[macro_export]
macro_rules! chain(
    { $( $binding:expr => $value:expr ),+ $(,)? } => {
        {
            let mut chain = std::collections::HashMap::new();
            $(
                match $crate::binding::parse_key_input($binding) {
                    None => panic!("could not parse key binding: {}", $binding),
                    Some(input) => chain.insert(input, $value),
                };
            )+
            $crate::binding::KeyBinding::Chain(chain)
        }
    };
);

#[macro_export]
macro_rules! build_key_bindings(
    { @start $key_bindings:expr,
        $( $binding:expr ),+ => $value:expr,
        $($tail:tt)*
    } => {
        $(
            match $crate::binding::parse_key_input($binding) {
                None => panic!("could not parse key binding: {}", $binding),
                Some(input) => $key_bindings.insert(input, $value),
            };
        )+
        build_key_bindings!(@start $key_bindings, $($tail)*);
    };

    { @start $key_bindings:expr,
        $($tail:tt)*
    } => {
        $(compile_error!(
            stringify!(incorrect syntax in build_key_bindings: $tail)
        );)*
    };

    { $($tokens:tt)+ } => {
        {
            let mut key_bindings = std::collections::HashMap::new();
            build_key_bindings!(@start key_bindings, $($tokens)+);
            $crate::binding::KeyBindings::new(key_bindings)
        }
    };
);

#[macro_export]
macro_rules! build_mouse_bindings(
    { @start $mouse_bindings:expr,
        $( $binding:expr ),+ => $action:expr,
        $($tail:tt)*
    } => {
        $(
            match $crate::binding::parse_mouse_input($binding) {
                None => panic!("could not parse mouse binding: {}", $binding),
                Some(input) => $mouse_bindings.insert(input, $action),
            };
        )+
        build_mouse_bindings!(@start $mouse_bindings, $($tail)*);
    };

    { @start $mouse_bindings:expr,
        $($tail:tt)*
    } => {
        $(compile_error!(
            stringify!(incorrect syntax in build_mouse_bindings: $tail)
        );)*
    };

    { $($tokens:tt)+ } => {
        {
            let mut mouse_bindings = std::collections::HashMap::new();
            build_mouse_bindings!(@start mouse_bindings, $($tokens)+);
            $crate::binding::MouseBindings::new(mouse_bindings)
        }
    };
);
