pub use enclose::*;

/// Builds an observable object literal.
#[macro_export]
macro_rules! obj {
	() => {
		$crate::Obj::new()
	};
	($($key:literal => $value:expr),+ $(,)?) => {{
		let obj = $crate::Obj::new();
		$(obj.set($key, $value);)+
		obj
	}};
}

/// Registers an effect, optionally cloning captures the `enclose` way.
#[macro_export]
macro_rules! effect {
	(( $($d_tt:tt)* ) => $($b:tt)*) => {
		$crate::Effect::new($crate::macros::enclose!(($( $d_tt )*) move || { $($b)* }))
	};
	($($b:tt)*) => {
		$crate::Effect::new(move || { $($b)* })
	};
}

/// Builds a computed value, optionally cloning captures the `enclose` way.
#[macro_export]
macro_rules! computed {
	(( $($d_tt:tt)* ) => $($b:tt)*) => {
		$crate::Computed::new($crate::macros::enclose!(($( $d_tt )*) move || { $($b)* }))
	};
	($($b:tt)*) => {
		$crate::Computed::new(move || { $($b)* })
	};
}
